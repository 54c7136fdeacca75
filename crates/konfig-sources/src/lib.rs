//! Variable sources for konfig.
//!
//! Provides source implementations for resolving variable definitions:
//! - Literal and field reference values
//! - Vault secrets
//! - Consul keys, plain and layered

pub mod consul;
pub mod memory;
pub mod pipeline;
pub mod registry;
pub mod simple;
pub mod vault;

#[cfg(test)]
mod stub;

pub use consul::{ConsulClient, ConsulSource, LayeredConsulSource};
pub use konfig_core::source::{KvStore, SecretEngine, Source};
pub use pipeline::{dedup, resolve};
pub use registry::SourceRegistry;
pub use simple::{LiteralSource, ReferenceSource};
pub use vault::{VaultClient, VaultSource};

/// Base URL for an address that may lack a scheme.
pub(crate) fn base_url(address: &str, default_scheme: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("{}://{}", default_scheme, address)
    }
}

/// Percent-encode every segment of a slash separated key.
pub(crate) fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("consul.service.consul", "http"), "http://consul.service.consul");
        assert_eq!(base_url("https://vault:8200/", "http"), "https://vault:8200");
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("svc/db/host"), "svc/db/host");
        assert_eq!(encode_path("/app/feature?flag"), "app/feature%3Fflag");
        assert_eq!(encode_path("a#b/100%/my key"), "a%23b/100%25/my%20key");
    }
}
