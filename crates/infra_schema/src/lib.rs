//! Schema Provisioning Infrastructure
//!
//! Supplies the [`SchemaHandle`](domain_tiss::SchemaHandle) used for
//! validation. The official TISS schema is read from the on-disk cache or
//! downloaded from the regulator; when neither works a deterministic fallback
//! is synthesized instead. Acquisition never fails past this crate.
//!
//! # Acquisition order
//!
//! ```text
//! fresh cache file -> remote fetch (timeout, retry) -> stale cache file -> fallback
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_schema::{SchemaProvisioner, SchemaProvisionerConfig};
//!
//! let provisioner = SchemaProvisioner::new(
//!     SchemaProvisionerConfig::default().cache_dir("/var/cache/tiss"),
//! )?;
//! let handle = provisioner.get_schema().await;
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod cache;
pub mod provisioner;

pub use config::{SchemaProvisionerConfig, DEFAULT_MAX_SCHEMA_BYTES, DEFAULT_SCHEMA_URL};
pub use error::{FetchError, ProvisionerError};
pub use fetch::SchemaFetcher;
pub use provisioner::SchemaProvisioner;
