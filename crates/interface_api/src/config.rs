//! API configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use domain_claims::OperatorIdentity;
use domain_tiss::{EncoderOptions, ValidationOptions, TISS_VERSION};
use infra_schema::{SchemaProvisionerConfig, DEFAULT_MAX_SCHEMA_BYTES, DEFAULT_SCHEMA_URL};

/// API configuration
///
/// Every field can be set through a `TISS_`-prefixed environment variable,
/// e.g. `TISS_PORT=9090` or `TISS_SCHEMA_CACHE_DIR=/var/cache/tiss`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// JSON snapshot seeding the record store
    pub records_path: Option<PathBuf>,
    pub operator_code: String,
    pub operator_ans_registration: String,
    pub guide_password: String,
    pub schema_url: String,
    pub schema_version: String,
    pub schema_cache_dir: PathBuf,
    pub schema_timeout_ms: u64,
    pub schema_max_attempts: u32,
    pub schema_retry_delay_ms: u64,
    pub schema_ttl_secs: u64,
    pub schema_fallback_ttl_secs: u64,
    pub schema_max_bytes: u64,
    /// Enforce the fallback schema too, not only the official one
    pub validate_with_fallback: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            records_path: None,
            operator_code: "000000".to_string(),
            operator_ans_registration: "000000".to_string(),
            guide_password: EncoderOptions::default().guide_password,
            schema_url: DEFAULT_SCHEMA_URL.to_string(),
            schema_version: TISS_VERSION.to_string(),
            schema_cache_dir: PathBuf::from("schemas"),
            schema_timeout_ms: 10_000,
            schema_max_attempts: 2,
            schema_retry_delay_ms: 250,
            schema_ttl_secs: 24 * 60 * 60,
            schema_fallback_ttl_secs: 5 * 60,
            schema_max_bytes: DEFAULT_MAX_SCHEMA_BYTES,
            validate_with_fallback: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("TISS"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn operator(&self) -> OperatorIdentity {
        OperatorIdentity::new(&self.operator_code, &self.operator_ans_registration)
    }

    pub fn encoder_options(&self) -> EncoderOptions {
        EncoderOptions {
            guide_password: self.guide_password.clone(),
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            validate_with_fallback: self.validate_with_fallback,
        }
    }

    pub fn provisioner_config(&self) -> SchemaProvisionerConfig {
        SchemaProvisionerConfig::new(&self.schema_url)
            .version(&self.schema_version)
            .cache_dir(&self.schema_cache_dir)
            .timeout(Duration::from_millis(self.schema_timeout_ms))
            .max_attempts(self.schema_max_attempts)
            .retry_delay(Duration::from_millis(self.schema_retry_delay_ms))
            .ttl(Duration::from_secs(self.schema_ttl_secs))
            .fallback_ttl(Duration::from_secs(self.schema_fallback_ttl_secs))
            .max_schema_bytes(self.schema_max_bytes)
    }
}
