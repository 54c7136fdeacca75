//! Variable definition grammar.
//!
//! Definitions look like:
//! - `literal(some value)` - Value embedded as is
//! - `reference(metadata.name)` - Field reference of the pod
//! - `vault(secret/db:password)` - Field of a Vault secret
//! - `consul(svc/db/host)` - Consul key
//! - `layered_consul(db_host#my_app@prod)` - Consul key looked up in layers
//!
//! Any of them can be followed by `->config` or `->secret` to pick the destination.

use crate::{ConfigError, ConfigResult};
use konfig_core::variable::{CONTEXT_APPNAME, CONTEXT_ENVIRONMENT};
use konfig_core::{Destination, SourceKind, VariableDefinition};
use regex::Regex;
use std::sync::LazyLock;

static DEFINITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<kind>\w+)\((?P<value>[^)]+)?\)(?:\s*->\s*(?P<destination>\w+))?$").unwrap()
});

static LAYERED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>[^#]+)(?:#(?P<appname>[^@]+)@(?P<environment>\w+))?$").unwrap()
});

/// Parse name/definition pairs, keeping their order.
///
/// The first malformed definition aborts the whole parse.
pub fn parse_definitions<I, K, V>(definitions: I) -> ConfigResult<Vec<VariableDefinition>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    definitions
        .into_iter()
        .map(|(name, value)| parse_definition(name.as_ref(), value.as_ref()))
        .collect()
}

/// Parse a single definition string.
pub fn parse_definition(name: &str, value: &str) -> ConfigResult<VariableDefinition> {
    let name = name.trim();
    let trimmed = value.trim();

    let caps = DEFINITION_REGEX
        .captures(trimmed)
        .ok_or_else(|| ConfigError::InvalidDefinition {
            name: name.to_string(),
            value: value.to_string(),
        })?;

    let kind_token = &caps["kind"];
    let kind: SourceKind = kind_token
        .parse()
        .map_err(|_| ConfigError::UnknownSource {
            name: name.to_string(),
            kind: kind_token.to_string(),
            value: value.to_string(),
        })?;

    let inner = caps.name("value").map(|m| m.as_str()).unwrap_or_default();

    let destination = match caps.name("destination") {
        Some(token) => {
            token
                .as_str()
                .parse::<Destination>()
                .map_err(|_| ConfigError::UnknownDestination {
                    name: name.to_string(),
                    destination: token.as_str().to_string(),
                    value: value.to_string(),
                })?
        }
        None => kind.default_destination(),
    };

    if kind != SourceKind::LayeredConsul {
        return Ok(VariableDefinition::new(name, kind, destination, inner));
    }

    let layered = LAYERED_REGEX
        .captures(inner)
        .ok_or_else(|| ConfigError::InvalidLayeredValue {
            name: name.to_string(),
            value: value.to_string(),
        })?;

    let mut definition = VariableDefinition::new(name, kind, destination, &layered["key"]);
    if let (Some(appname), Some(environment)) = (layered.name("appname"), layered.name("environment")) {
        definition = definition
            .with_context(CONTEXT_APPNAME, appname.as_str())
            .with_context(CONTEXT_ENVIRONMENT, environment.as_str());
    }

    Ok(definition)
}

/// Render a definition back into its string form.
pub fn render_definition(definition: &VariableDefinition) -> String {
    let value = match definition.layered_context() {
        Some((appname, environment)) if definition.kind == SourceKind::LayeredConsul => {
            format!("{}#{}@{}", definition.raw_value, appname, environment)
        }
        _ => definition.raw_value.clone(),
    };
    format!("{}({})->{}", definition.kind, value, definition.destination)
}
