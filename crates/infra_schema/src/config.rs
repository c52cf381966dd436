//! Schema provisioner configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use domain_tiss::TISS_VERSION;

/// Where the regulator publishes the TISS 3.05.00 schema
pub const DEFAULT_SCHEMA_URL: &str = "https://www.gov.br/ans/pt-br/arquivos/assuntos/prestadores-de-servicos-de-saude/tabela-unificada/downloads/tiss-3-05-00.xsd";

/// Default cap on a downloaded schema body
pub const DEFAULT_MAX_SCHEMA_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for [`SchemaProvisioner`](crate::SchemaProvisioner)
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use infra_schema::SchemaProvisionerConfig;
///
/// let config = SchemaProvisionerConfig::new("http://localhost:9000/tiss.xsd")
///     .cache_dir("/tmp/tiss")
///     .timeout(Duration::from_secs(2))
///     .max_attempts(3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaProvisionerConfig {
    /// Remote schema location; empty disables fetching
    pub url: String,
    /// Version recorded on official handles and used in cache file names
    pub version: String,
    pub cache_dir: PathBuf,
    /// Bound on a single request
    pub timeout: Duration,
    /// Total request attempts, the first included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt
    pub retry_delay: Duration,
    /// How long an official handle is served before re-acquisition
    pub ttl: Duration,
    /// How long a fallback handle is served before the official source is retried
    pub fallback_ttl: Duration,
    /// Largest schema body accepted from the remote source
    pub max_schema_bytes: u64,
}

impl SchemaProvisionerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: TISS_VERSION.to_string(),
            cache_dir: PathBuf::from("schemas"),
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            retry_delay: Duration::from_millis(250),
            ttl: Duration::from_secs(24 * 60 * 60),
            fallback_ttl: Duration::from_secs(5 * 60),
            max_schema_bytes: DEFAULT_MAX_SCHEMA_BYTES,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the attempt budget (at least one attempt is always made)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    pub fn max_schema_bytes(mut self, bytes: u64) -> Self {
        self.max_schema_bytes = bytes;
        self
    }

    /// `<cache_dir>/tiss_<version>.xsd`
    pub fn official_cache_path(&self) -> PathBuf {
        self.cache_dir.join(format!("tiss_{}.xsd", self.version))
    }

    /// `<cache_dir>/tiss_<version>_fallback.xsd`
    pub fn fallback_cache_path(&self) -> PathBuf {
        self.cache_dir.join(format!("tiss_{}_fallback.xsd", self.version))
    }
}

impl Default for SchemaProvisionerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchemaProvisionerConfig::default();
        assert_eq!(config.url, DEFAULT_SCHEMA_URL);
        assert_eq!(config.version, "3.05.00");
        assert_eq!(config.max_attempts, 2);
        assert!(config.fallback_ttl < config.ttl);
        assert_eq!(config.max_schema_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_cache_paths() {
        let config = SchemaProvisionerConfig::default().cache_dir("/tmp/x");
        assert_eq!(config.official_cache_path(), PathBuf::from("/tmp/x/tiss_3.05.00.xsd"));
        assert_eq!(
            config.fallback_cache_path(),
            PathBuf::from("/tmp/x/tiss_3.05.00_fallback.xsd")
        );
    }
}
