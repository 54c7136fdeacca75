//! Configuration parsing for konfig.
//!
//! This crate handles parsing of:
//! - Variable definitions (`consul(path)->secret` and friends)
//! - Tool configuration (konfig.kdl)

pub mod definitions;
pub mod error;
pub mod settings;

pub use definitions::{parse_definition, parse_definitions, render_definition};
pub use error::{ConfigError, ConfigResult};
pub use settings::{
    ApplicationSettings, ConsulSettings, DEFAULT_LOG_LEVEL, Settings, VaultSettings,
};
