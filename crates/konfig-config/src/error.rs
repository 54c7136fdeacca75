//! Configuration parsing errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("error parsing variable definition ({name}): {value}")]
    InvalidDefinition { name: String, value: String },

    #[error("unknown variable source '{kind}' ({name}): {value}")]
    UnknownSource {
        name: String,
        kind: String,
        value: String,
    },

    #[error("unknown variable destination '{destination}' ({name}): {value}")]
    UnknownDestination {
        name: String,
        destination: String,
        value: String,
    },

    #[error("error parsing layered consul value ({name}): {value}")]
    InvalidLayeredValue { name: String, value: String },

    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
