//! Resolution pipeline - resolves definitions in order through the registry.

use crate::registry::SourceRegistry;
use konfig_core::{Destination, Error, Result, Variable, VariableDefinition};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Resolve every definition, in order.
///
/// The first failure aborts the run and no variables are returned. Duplicates are
/// dropped as described on [`dedup`].
pub async fn resolve(
    registry: &SourceRegistry,
    definitions: &[VariableDefinition],
) -> Result<Vec<Variable>> {
    let mut variables = Vec::with_capacity(definitions.len());

    for definition in definitions {
        let source = registry
            .get(definition.kind)
            .ok_or_else(|| Error::UnknownSource {
                name: definition.name.clone(),
                kind: definition.kind,
            })?;

        debug!(variable = %definition.name, source = %definition.kind, "Resolving variable");
        variables.push(source.fetch(definition).await?);
    }

    Ok(dedup(variables))
}

/// Keep the first variable of every `(name, destination)` pair, in order.
///
/// Later duplicates are skipped with a warning.
pub fn dedup(variables: impl IntoIterator<Item = Variable>) -> Vec<Variable> {
    let mut seen: HashSet<(String, Destination)> = HashSet::new();

    variables
        .into_iter()
        .filter(|variable| {
            let fresh = seen.insert((variable.name.clone(), variable.destination));
            if !fresh {
                warn!(
                    variable = %variable.name,
                    destination = %variable.destination,
                    "Duplicate variable, keeping the first definition"
                );
            }
            fresh
        })
        .collect()
}
