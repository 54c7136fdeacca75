//! Deployment side of konfig.
//!
//! - Reconciling resolved variables into a container's environment
//! - Diffs of environments and rendered documents
//! - Multi-document manifest reading and writing
//! - Output formats for resolved variables

pub mod diff;
pub mod manifest;
pub mod outputs;
pub mod reconcile;

pub use diff::{EnvDiff, diff_env, render_text_diff};
pub use manifest::{DOCUMENT_SEPARATOR, Manifest, to_yaml};
pub use outputs::{OutputFormat, build_objects, render};
pub use reconcile::{ObjectNames, Reconciliation, desired_source, merge, reconcile_deployment};
