//! Error types for konfig.

use thiserror::Error;

use crate::variable::SourceKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no source registered for {kind} (variable '{name}')")]
    UnknownSource { name: String, kind: SourceKind },

    #[error("{expected} source cannot resolve variable '{name}' of kind {actual}")]
    KindMismatch {
        name: String,
        expected: SourceKind,
        actual: SourceKind,
    },

    #[error("invalid value for variable '{name}' ({kind}): {message}")]
    InvalidValue {
        name: String,
        kind: SourceKind,
        message: String,
    },

    #[error("value for variable '{name}' ({kind}) is missing: {path}")]
    NotFound {
        name: String,
        kind: SourceKind,
        path: String,
    },

    #[error("{kind} request failed: {message}")]
    Remote { kind: SourceKind, message: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("could not find container '{0}' in deployment")]
    ContainerNotFound(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
