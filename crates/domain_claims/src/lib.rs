//! Claims Records Domain
//!
//! This crate models the stored records a TISS document is built from and
//! resolves them into an immutable [`ClaimBundle`].
//!
//! # Claim Lifecycle
//!
//! ```text
//! Pending -> Approved -> Paid
//!         \-> Denied
//! ```
//!
//! # Assembly
//!
//! ```text
//! ClaimId -> ClaimRecordsPort (claim, patient, provider, plan) -> ClaimBundle
//! ```

pub mod claim;
pub mod patient;
pub mod provider;
pub mod health_plan;
pub mod ports;
pub mod adapters;
pub mod bundle;
pub mod assembler;
pub mod error;

pub use claim::{ClaimRecord, ClaimStatus};
pub use patient::{PatientRecord, Gender};
pub use provider::{ProviderRecord, ProviderType};
pub use health_plan::HealthPlanRecord;
pub use ports::ClaimRecordsPort;
pub use adapters::{InMemoryClaimRecords, RecordSnapshot};
pub use bundle::{ClaimBundle, BundleClaim, BundlePatient, BundleProvider, BundlePlan, OperatorIdentity};
pub use assembler::ClaimBundleAssembler;
pub use error::ClaimError;
