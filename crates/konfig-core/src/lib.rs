//! Core domain types and traits for konfig.
//!
//! This crate contains:
//! - Variable definitions and resolved variables
//! - The source trait implemented by every variable source
//! - Remote store abstractions (key-value stores, secret engines)

pub mod error;
pub mod source;
pub mod variable;

pub use error::{Error, Result};
pub use source::{KvStore, SecretEngine, Source};
pub use variable::{Destination, SourceKind, ValueKind, Variable, VariableDefinition};
