//! Merging resolved variables into a container's environment.

use crate::diff::{EnvDiff, diff_env};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, EnvVar, EnvVarSource, ObjectFieldSelector, SecretKeySelector,
};
use konfig_core::{Destination, Error, Result, ValueKind, Variable};
use tracing::debug;

/// Names of the ConfigMap and Secret objects the environment points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    pub config_map: String,
    pub secret: String,
}

impl ObjectNames {
    pub fn new(config_map: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            config_map: config_map.into(),
            secret: secret.into(),
        }
    }
}

/// Outcome of reconciling a deployment.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub deployment: Deployment,
    pub diff: EnvDiff,
}

/// Where the environment entry of a variable takes its value from.
pub fn desired_source(variable: &Variable, names: &ObjectNames) -> EnvVarSource {
    let key = variable.name.to_lowercase();

    match (variable.value_kind, variable.destination) {
        (ValueKind::Referenced, _) => EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                api_version: None,
                field_path: variable.value.clone(),
            }),
            ..Default::default()
        },
        (ValueKind::Literal, Destination::Config) => EnvVarSource {
            config_map_key_ref: Some(ConfigMapKeySelector {
                key,
                name: names.config_map.clone(),
                optional: None,
            }),
            ..Default::default()
        },
        (ValueKind::Literal, Destination::Secret) => EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                key,
                name: names.secret.clone(),
                optional: None,
            }),
            ..Default::default()
        },
    }
}

/// Merge variables into an environment list.
///
/// Entries are matched by upper-cased name. A matching entry keeps its position, takes
/// the upper-cased name and gets its value replaced; anything else is appended. With `overwrite`, the old
/// entries are dropped first.
pub fn merge(
    old: &[EnvVar],
    variables: &[Variable],
    names: &ObjectNames,
    overwrite: bool,
) -> Vec<EnvVar> {
    let mut env: Vec<EnvVar> = if overwrite { Vec::new() } else { old.to_vec() };

    for variable in variables {
        let name = variable.name.to_uppercase();
        let source = desired_source(variable, names);

        match env.iter_mut().find(|e| e.name.to_uppercase() == name) {
            Some(entry) => {
                entry.name = name;
                entry.value = None;
                entry.value_from = Some(source);
            }
            None => env.push(EnvVar {
                name,
                value: None,
                value_from: Some(source),
            }),
        }
    }

    env
}

/// Reconcile the environment of one container of a deployment.
///
/// The input is left untouched; the updated copy is returned with the diff.
pub fn reconcile_deployment(
    deployment: &Deployment,
    container: &str,
    variables: &[Variable],
    names: &ObjectNames,
    overwrite: bool,
) -> Result<Reconciliation> {
    let mut updated = deployment.clone();

    let target = updated
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|pod| pod.containers.iter_mut().find(|c| c.name == container))
        .ok_or_else(|| Error::ContainerNotFound(container.to_string()))?;

    let old = target.env.clone().unwrap_or_default();
    let new = merge(&old, variables, names, overwrite);
    let diff = diff_env(&old, &new);

    debug!(
        container = %container,
        added = diff.added.len(),
        changed = diff.changed.len(),
        removed = diff.removed.len(),
        "Reconciled container environment"
    );

    target.env = if new.is_empty() { None } else { Some(new) };

    Ok(Reconciliation {
        deployment: updated,
        diff,
    })
}
