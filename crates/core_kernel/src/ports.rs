//! Ports and Adapters Infrastructure
//!
//! The codec reads claims, patients, providers and health plans from a record
//! store it does not own, and schemas from a provider it does not control.
//! Each collaborator is reached through a port trait defined in its domain
//! crate; adapters implement those traits and report failures as [`PortError`].
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        Codec Facade          │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  Port traits (ClaimRecords,  │
//! │  SchemaProvider)             │
//! └──────────────────────────────┘
//!        ▲                ▲
//!        │                │
//!  ┌─────┴──────┐   ┌─────┴──────────┐
//!  │ In-memory  │   │ Remote schema  │
//!  │ records    │   │ provisioner    │
//!  └────────────┘   └────────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a record store adapter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The store could not be reached
    #[error("Store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Stored data could not be mapped into records
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        PortError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// Ports are shared behind `Arc` across request tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Serving, but with reduced guarantees (e.g. fallback schema)
    Degraded,
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Claim", 123);
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Not found: Claim with id 123");
    }

    #[test]
    fn test_internal_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = PortError::internal("cannot read snapshot", io);
        assert!(!error.is_not_found());
        assert!(std::error::Error::source(&error).is_some());
        assert!(!PortError::unavailable("refused").is_not_found());
    }
}
