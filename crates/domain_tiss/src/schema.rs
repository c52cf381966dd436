//! Schema handles and the schema provider port
//!
//! A [`SchemaHandle`] is an immutable snapshot of one acquired schema: where
//! it came from, what it contains, and the compiled model. Providers hand out
//! `Arc<SchemaHandle>` and refresh by replacing the handle, never by editing
//! it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use core_kernel::ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable};

use crate::fallback::{fallback_schema, render_fallback_xsd, FALLBACK_VERSION};
use crate::xsd::{SchemaCompileError, XsdSchema};

/// Provenance of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSource {
    /// Published by the regulator
    Official,
    /// Synthesized locally
    Fallback,
}

impl std::fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaSource::Official => f.write_str("official"),
            SchemaSource::Fallback => f.write_str("fallback"),
        }
    }
}

/// SHA-256 of the schema text, lowercase hex
pub fn schema_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Immutable reference to the schema in use
#[derive(Debug, Clone, Serialize)]
pub struct SchemaHandle {
    pub source_kind: SchemaSource,
    pub version: String,
    /// File the schema text was read from or written to, if any
    pub location: Option<PathBuf>,
    pub size_bytes: u64,
    pub digest: String,
    pub retrieved_at: DateTime<Utc>,
    pub target_namespace: Option<String>,
    pub root_elements: Vec<String>,
    /// Schema constructs the engine leaves unconstrained
    pub unsupported: Vec<String>,
    #[serde(skip)]
    schema: Arc<XsdSchema>,
}

impl SchemaHandle {
    fn from_parts(
        source_kind: SchemaSource,
        version: String,
        text: &str,
        schema: XsdSchema,
        location: Option<PathBuf>,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_kind,
            version,
            location,
            size_bytes: text.len() as u64,
            digest: schema_digest(text),
            retrieved_at,
            target_namespace: schema.target_namespace().map(str::to_string),
            root_elements: schema.root_elements(),
            unsupported: schema.unsupported().to_vec(),
            schema: Arc::new(schema),
        }
    }

    /// Compiles official schema text
    pub fn official(
        version: impl Into<String>,
        text: &str,
        location: Option<PathBuf>,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Self, SchemaCompileError> {
        let schema = XsdSchema::compile(text)?;
        Ok(Self::from_parts(
            SchemaSource::Official,
            version.into(),
            text,
            schema,
            location,
            retrieved_at,
        ))
    }

    /// The synthesized fallback
    pub fn fallback(location: Option<PathBuf>, retrieved_at: DateTime<Utc>) -> Self {
        Self::from_parts(
            SchemaSource::Fallback,
            FALLBACK_VERSION.to_string(),
            &render_fallback_xsd(),
            fallback_schema(),
            location,
            retrieved_at,
        )
    }

    pub fn schema(&self) -> &XsdSchema {
        &self.schema
    }

    pub fn is_official(&self) -> bool {
        self.source_kind == SchemaSource::Official
    }

    pub fn is_fallback(&self) -> bool {
        self.source_kind == SchemaSource::Fallback
    }
}

/// Source of the schema handle used for validation
///
/// Implementations never fail: acquisition problems degrade to the fallback.
#[async_trait]
pub trait SchemaProvider: DomainPort + HealthCheckable {
    async fn get_schema(&self) -> Arc<SchemaHandle>;
}

/// Provider that always returns the same handle
#[derive(Debug, Clone)]
pub struct StaticSchemaProvider {
    handle: Arc<SchemaHandle>,
}

impl StaticSchemaProvider {
    pub fn new(handle: SchemaHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Serves the in-memory fallback, written nowhere
    pub fn fallback() -> Self {
        Self::new(SchemaHandle::fallback(None, Utc::now()))
    }
}

impl DomainPort for StaticSchemaProvider {}

#[async_trait]
impl HealthCheckable for StaticSchemaProvider {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "static-schema".to_string(),
            status: if self.handle.is_official() {
                AdapterHealth::Healthy
            } else {
                AdapterHealth::Degraded
            },
            message: Some(format!(
                "{} schema {}",
                self.handle.source_kind, self.handle.version
            )),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn get_schema(&self) -> Arc<SchemaHandle> {
        Arc::clone(&self.handle)
    }
}
