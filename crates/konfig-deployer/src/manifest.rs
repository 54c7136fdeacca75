//! Reading and writing Kubernetes YAML manifests.
//!
//! A manifest file may hold several documents. Only the first one of the requested
//! kind is decoded; every other document is kept verbatim so writing the file back
//! does not lose unrelated content.

use k8s_openapi::Resource;
use konfig_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::warn;

pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// A decoded resource plus the documents that surrounded it.
#[derive(Debug, Clone)]
pub struct Manifest<K> {
    pub resource: K,
    pub leftover: Vec<String>,
}

impl<K> Manifest<K>
where
    K: Resource + DeserializeOwned + Serialize,
{
    /// Decode the first document of kind `K`.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut documents: Vec<String> = contents
            .split(DOCUMENT_SEPARATOR)
            .map(str::to_string)
            .collect();

        let mut found = None;
        for (idx, document) in documents.iter().enumerate() {
            let value: serde_yaml::Value = match serde_yaml::from_str(document) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "Error parsing YAML document");
                    continue;
                }
            };

            if value.get("kind").and_then(|k| k.as_str()) == Some(K::KIND) {
                let resource: K = serde_yaml::from_value(value)
                    .map_err(|e| Error::Manifest(format!("invalid {}: {}", K::KIND, e)))?;
                found = Some((idx, resource));
                break;
            }
        }

        let (idx, resource) =
            found.ok_or_else(|| Error::Manifest(format!("could not find a {} document", K::KIND)))?;
        documents.remove(idx);

        Ok(Self {
            resource,
            leftover: documents,
        })
    }

    /// Read and decode a manifest file.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// The same surrounding documents around another resource.
    pub fn with_resource(&self, resource: K) -> Self {
        Self {
            resource,
            leftover: self.leftover.clone(),
        }
    }

    /// Encode the manifest, the resource placed after the leftover documents.
    pub fn render(&self) -> Result<String> {
        let mut documents = self.leftover.clone();
        documents.push(to_yaml(&self.resource)?);
        Ok(documents.join(DOCUMENT_SEPARATOR))
    }

    /// Encode the manifest into a file.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render()?)?;
        Ok(())
    }
}

/// Serialize a value as a YAML document.
pub fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| Error::Manifest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{ConfigMap, Secret};

    const SERVICE: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n";
    const DEPLOYMENT: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    spec:
      containers:
        - name: web
          image: nginx
          env:
            - name: EXISTING
              value: "1"
"#;

    #[test]
    fn test_parse_keeps_leftovers() {
        let contents = format!("{}{}{}", SERVICE, DOCUMENT_SEPARATOR, DEPLOYMENT);
        let manifest = Manifest::<Deployment>::parse(&contents).unwrap();

        assert_eq!(manifest.resource.metadata.name.as_deref(), Some("web"));
        assert_eq!(manifest.leftover, vec![SERVICE.to_string()]);
    }

    #[test]
    fn test_render_appends_resource() {
        let contents = format!("{}{}{}", DEPLOYMENT, DOCUMENT_SEPARATOR, SERVICE);
        let manifest = Manifest::<Deployment>::parse(&contents).unwrap();
        let rendered = manifest.render().unwrap();

        assert!(rendered.starts_with(SERVICE));
        assert!(rendered.contains("kind: Deployment"));

        let reparsed = Manifest::<Deployment>::parse(&rendered).unwrap();
        assert_eq!(reparsed.resource, manifest.resource);
        assert_eq!(reparsed.leftover, manifest.leftover);
    }

    #[test]
    fn test_invalid_documents_are_kept() {
        let broken = "key: [unclosed\n";
        let contents = format!("{}{}{}", broken, DOCUMENT_SEPARATOR, DEPLOYMENT);
        let manifest = Manifest::<Deployment>::parse(&contents).unwrap();

        assert_eq!(manifest.leftover, vec![broken.to_string()]);
    }

    #[test]
    fn test_missing_kind() {
        let err = Manifest::<ConfigMap>::parse(DEPLOYMENT).unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn test_parse_secret_and_config_map() {
        let contents = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: web-config\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: web-secret\n";

        let config_map = Manifest::<ConfigMap>::parse(contents).unwrap();
        assert_eq!(config_map.resource.metadata.name.as_deref(), Some("web-config"));

        let secret = Manifest::<Secret>::parse(contents).unwrap();
        assert_eq!(secret.resource.metadata.name.as_deref(), Some("web-secret"));
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.yaml");

        let contents = format!("{}{}{}", SERVICE, DOCUMENT_SEPARATOR, DEPLOYMENT);
        let manifest = Manifest::<Deployment>::parse(&contents).unwrap();
        manifest.write(&path).unwrap();

        let read = Manifest::<Deployment>::read(&path).unwrap();
        assert_eq!(read.resource, manifest.resource);
        assert_eq!(read.leftover, vec![SERVICE.to_string()]);
    }
}
