//! Variable definitions and resolved variables.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Context key holding the application name of a layered Consul lookup.
pub const CONTEXT_APPNAME: &str = "appname";
/// Context key holding the environment of a layered Consul lookup.
pub const CONTEXT_ENVIRONMENT: &str = "environment";

/// Where the value of a variable comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[display("literal")]
    Literal,
    #[display("reference")]
    Reference,
    #[display("vault")]
    Vault,
    #[display("consul")]
    Consul,
    #[display("layered_consul")]
    LayeredConsul,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Literal,
        SourceKind::Reference,
        SourceKind::Vault,
        SourceKind::Consul,
        SourceKind::LayeredConsul,
    ];

    /// Destination used when a definition does not name one.
    pub fn default_destination(self) -> Destination {
        match self {
            SourceKind::Vault => Destination::Secret,
            _ => Destination::Config,
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| format!("unknown source kind: {}", s))
    }
}

/// Whether a variable ends up in a ConfigMap or a Secret.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    #[default]
    #[display("config")]
    Config,
    #[display("secret")]
    Secret,
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "config" => Ok(Destination::Config),
            "secret" => Ok(Destination::Secret),
            _ => Err(format!("unknown destination: {}", s)),
        }
    }
}

/// How the value of a resolved variable should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// The value is embedded directly.
    #[display("literal")]
    Literal,
    /// The value is a field path of the pod, not stored data.
    #[display("referenced")]
    Referenced,
}

/// A parsed declaration of where a value comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    pub kind: SourceKind,
    pub destination: Destination,
    /// Literal string, field path or remote key, depending on `kind`.
    pub raw_value: String,
    /// Only populated for layered Consul definitions.
    pub context: HashMap<String, String>,
}

impl VariableDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: SourceKind,
        destination: Destination,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            destination,
            raw_value: raw_value.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Application name and environment of a layered lookup, if both are set.
    pub fn layered_context(&self) -> Option<(&str, &str)> {
        let appname = self.context.get(CONTEXT_APPNAME)?;
        let environment = self.context.get(CONTEXT_ENVIRONMENT)?;
        if appname.is_empty() || environment.is_empty() {
            return None;
        }
        Some((appname, environment))
    }
}

/// A resolved value ready to be merged into a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub destination: Destination,
    pub value_kind: ValueKind,
    pub value: String,
}

impl Variable {
    /// A literal variable carrying the definition's name and destination.
    pub fn literal(definition: &VariableDefinition, value: impl Into<String>) -> Self {
        Self {
            name: definition.name.clone(),
            destination: definition.destination,
            value_kind: ValueKind::Literal,
            value: value.into(),
        }
    }

    /// A field reference variable carrying the definition's name and destination.
    pub fn referenced(definition: &VariableDefinition, field_path: impl Into<String>) -> Self {
        Self {
            name: definition.name.clone(),
            destination: definition.destination,
            value_kind: ValueKind::Referenced,
            value: field_path.into(),
        }
    }

    /// Builds a variable from a definition without contacting any source.
    ///
    /// Reconciliation only needs the name, destination and value kind, so this is
    /// enough to lay out a deployment's environment before any value is fetched.
    pub fn unresolved(definition: &VariableDefinition) -> Self {
        match definition.kind {
            SourceKind::Reference => Self::referenced(definition, definition.raw_value.clone()),
            _ => Self::literal(definition, definition.raw_value.clone()),
        }
    }

    pub fn is_referenced(&self) -> bool {
        self.value_kind == ValueKind::Referenced
    }
}
