//! TISS codec errors

use std::path::PathBuf;
use thiserror::Error;

use domain_claims::ClaimError;

/// Errors returned by the encoder and the codec facade
///
/// Validation problems are never errors; they are reported as findings.
#[derive(Debug, Error)]
pub enum TissError {
    /// Claim assembly failed (record missing or incomplete)
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// A complete bundle could not be serialized; always a bug
    #[error("TISS encoding failed: {0}")]
    Encoding(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TissError {
    pub fn encoding(message: impl Into<String>) -> Self {
        TissError::Encoding(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TissError::Claim(e) if e.is_not_found())
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, TissError::Claim(e) if e.is_incomplete())
    }
}
