//! Output formats for resolved variables.

use crate::manifest::{DOCUMENT_SEPARATOR, to_yaml};
use derive_more::Display;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use konfig_core::{Destination, Result, Variable};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OutputFormat {
    #[display("dockerenv")]
    DockerEnv,
    #[display("envoneline")]
    EnvOneline,
    #[display("envrc")]
    Envrc,
    #[display("k8s-yaml")]
    K8sYaml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::DockerEnv,
        OutputFormat::EnvOneline,
        OutputFormat::Envrc,
        OutputFormat::K8sYaml,
    ];

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.to_string()).collect()
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.to_string() == s)
            .ok_or_else(|| {
                format!(
                    "unknown output format '{}' (available formats: {})",
                    s,
                    Self::names().join(", ")
                )
            })
    }
}

/// Render variables in the given format.
///
/// `name` and `namespace` are only used by `k8s-yaml`.
pub fn render(
    format: OutputFormat,
    name: &str,
    namespace: &str,
    variables: &[Variable],
) -> Result<String> {
    match format {
        OutputFormat::DockerEnv => Ok(docker_env(variables)),
        OutputFormat::EnvOneline => Ok(env_oneline(variables)),
        OutputFormat::Envrc => Ok(envrc(variables)),
        OutputFormat::K8sYaml => k8s_yaml(name, namespace, variables),
    }
}

fn quote_calls(value: &str) -> String {
    if value.contains('(') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn docker_env(variables: &[Variable]) -> String {
    let mut out = String::new();
    for variable in variables.iter().filter(|v| !v.is_referenced()) {
        let _ = writeln!(
            out,
            "{}={}",
            variable.name.to_uppercase(),
            quote_calls(&variable.value)
        );
    }
    out
}

fn env_oneline(variables: &[Variable]) -> String {
    let mut out = String::new();
    for variable in variables.iter().filter(|v| !v.is_referenced()) {
        let _ = write!(out, "{}=\"{}\" ", variable.name.to_uppercase(), variable.value);
    }
    out
}

fn envrc(variables: &[Variable]) -> String {
    let mut out = String::new();
    for variable in variables {
        let _ = writeln!(
            out,
            "export {}=\"{}\"",
            variable.name.to_uppercase(),
            variable.value
        );
    }
    out
}

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// The ConfigMap and Secret holding the literal variables.
pub fn build_objects(name: &str, namespace: &str, variables: &[Variable]) -> (ConfigMap, Secret) {
    let mut config = BTreeMap::new();
    let mut secret = BTreeMap::new();

    for variable in variables.iter().filter(|v| !v.is_referenced()) {
        let key = variable.name.to_lowercase();
        match variable.destination {
            Destination::Config => {
                config.insert(key, variable.value.clone());
            }
            Destination::Secret => {
                secret.insert(key, ByteString(variable.value.clone().into_bytes()));
            }
        }
    }

    let config_map = ConfigMap {
        metadata: metadata(name, namespace),
        data: Some(config),
        ..Default::default()
    };
    let secret = Secret {
        metadata: metadata(name, namespace),
        data: Some(secret),
        ..Default::default()
    };

    (config_map, secret)
}

fn k8s_yaml(name: &str, namespace: &str, variables: &[Variable]) -> Result<String> {
    let (config_map, secret) = build_objects(name, namespace, variables);
    Ok([to_yaml(&config_map)?, to_yaml(&secret)?].join(DOCUMENT_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use konfig_core::ValueKind;

    fn var(name: &str, destination: Destination, value_kind: ValueKind, value: &str) -> Variable {
        Variable {
            name: name.to_string(),
            destination,
            value_kind,
            value: value.to_string(),
        }
    }

    fn sample() -> Vec<Variable> {
        vec![
            var("db_host", Destination::Config, ValueKind::Literal, "10.0.0.5"),
            var("db_pass", Destination::Secret, ValueKind::Literal, "s3cr3t"),
            var("cmd", Destination::Config, ValueKind::Literal, "run(fast)"),
            var("node", Destination::Config, ValueKind::Referenced, "spec.nodeName"),
        ]
    }

    #[test]
    fn test_format_names() {
        for format in OutputFormat::ALL {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }

        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("k8s-yaml"));
        assert!(err.contains("dockerenv"));
    }

    #[test]
    fn test_docker_env() {
        let out = render(OutputFormat::DockerEnv, "app", "dev", &sample()).unwrap();
        assert_eq!(out, "DB_HOST=10.0.0.5\nDB_PASS=s3cr3t\nCMD=\"run(fast)\"\n");
    }

    #[test]
    fn test_env_oneline() {
        let out = render(OutputFormat::EnvOneline, "app", "dev", &sample()).unwrap();
        assert_eq!(out, "DB_HOST=\"10.0.0.5\" DB_PASS=\"s3cr3t\" CMD=\"run(fast)\" ");
    }

    #[test]
    fn test_envrc() {
        let out = render(OutputFormat::Envrc, "app", "dev", &sample()[..2]).unwrap();
        assert_eq!(out, "export DB_HOST=\"10.0.0.5\"\nexport DB_PASS=\"s3cr3t\"\n");
    }

    #[test]
    fn test_build_objects() {
        let (config_map, secret) = build_objects("app", "dev", &sample());

        assert_eq!(config_map.metadata.name.as_deref(), Some("app"));
        assert_eq!(config_map.metadata.namespace.as_deref(), Some("dev"));
        let data = config_map.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["db_host"], "10.0.0.5");
        assert!(!data.contains_key("node"));

        let data = secret.data.unwrap();
        assert_eq!(data["db_pass"], ByteString(b"s3cr3t".to_vec()));
    }

    #[test]
    fn test_k8s_yaml() {
        let out = render(OutputFormat::K8sYaml, "app", "dev", &sample()).unwrap();
        let documents: Vec<&str> = out.split(DOCUMENT_SEPARATOR).collect();

        assert_eq!(documents.len(), 2);
        assert!(documents[0].contains("kind: ConfigMap"));
        assert!(documents[1].contains("kind: Secret"));
        // base64 of "s3cr3t"
        assert!(documents[1].contains("czNjcjN0"));
    }
}
