//! Sources that need no remote store.

use async_trait::async_trait;
use konfig_core::source::ensure_kind;
use konfig_core::{Result, Source, SourceKind, Variable, VariableDefinition};

/// Embeds the definition's value as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralSource;

#[async_trait]
impl Source for LiteralSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Literal
    }

    async fn fetch(&self, definition: &VariableDefinition) -> Result<Variable> {
        ensure_kind(definition, SourceKind::Literal)?;
        Ok(Variable::literal(definition, definition.raw_value.clone()))
    }
}

/// Passes a field path through so it ends up as a `fieldRef`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceSource;

#[async_trait]
impl Source for ReferenceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Reference
    }

    async fn fetch(&self, definition: &VariableDefinition) -> Result<Variable> {
        ensure_kind(definition, SourceKind::Reference)?;
        Ok(Variable::referenced(definition, definition.raw_value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use konfig_core::{Destination, Error, ValueKind};

    #[tokio::test]
    async fn test_literal_source() {
        let def = VariableDefinition::new("greeting", SourceKind::Literal, Destination::Secret, "hi");
        let var = LiteralSource.fetch(&def).await.unwrap();

        assert_eq!(var.name, "greeting");
        assert_eq!(var.value, "hi");
        assert_eq!(var.value_kind, ValueKind::Literal);
        assert_eq!(var.destination, Destination::Secret);
    }

    #[tokio::test]
    async fn test_reference_source() {
        let def = VariableDefinition::new(
            "node",
            SourceKind::Reference,
            Destination::Config,
            "spec.nodeName",
        );
        let var = ReferenceSource.fetch(&def).await.unwrap();

        assert_eq!(var.value, "spec.nodeName");
        assert_eq!(var.value_kind, ValueKind::Referenced);
    }

    #[tokio::test]
    async fn test_wrong_kind_is_rejected() {
        let def = VariableDefinition::new("x", SourceKind::Consul, Destination::Config, "a/b");

        let err = LiteralSource.fetch(&def).await.unwrap_err();
        assert!(matches!(
            err,
            Error::KindMismatch {
                expected: SourceKind::Literal,
                actual: SourceKind::Consul,
                ..
            }
        ));
        assert!(ReferenceSource.fetch(&def).await.is_err());
    }
}
