//! Claims domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The claim or one of the records it references does not exist
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A resolved record lacks a value the TISS encoder requires
    #[error("{entity} {id} is missing a usable {field}: {reason}")]
    IncompleteRecord {
        entity: &'static str,
        id: i64,
        field: &'static str,
        reason: String,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// The record store failed for a reason other than a missing record
    #[error("Record store error: {0}")]
    Storage(#[source] PortError),
}

impl ClaimError {
    pub fn incomplete(
        entity: &'static str,
        id: i64,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        ClaimError::IncompleteRecord {
            entity,
            id,
            field,
            reason: reason.into(),
        }
    }

    /// Maps a port failure for `entity`/`id`, keeping not-found distinct
    pub fn from_port(entity: &'static str, id: i64, error: PortError) -> Self {
        if error.is_not_found() {
            ClaimError::NotFound { entity, id }
        } else {
            ClaimError::Storage(error)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClaimError::NotFound { .. })
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, ClaimError::IncompleteRecord { .. })
    }
}
