//! Claims Domain Ports
//!
//! The codec never owns claim storage. It reads the four record kinds a TISS
//! guide is built from through [`ClaimRecordsPort`]; adapters decide where
//! those records live (relational store, remote system, memory).
//!
//! ```rust,ignore
//! use domain_claims::{ClaimBundleAssembler, ClaimRecordsPort};
//! use std::sync::Arc;
//!
//! let records: Arc<dyn ClaimRecordsPort> = Arc::new(InMemoryClaimRecords::new());
//! let assembler = ClaimBundleAssembler::new(records, operator);
//! let bundle = assembler.assemble(ClaimId::new(1)).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{
    ClaimId, DomainPort, HealthCheckable, HealthPlanId, PatientId, PortError, ProviderId,
};

use crate::claim::ClaimRecord;
use crate::health_plan::HealthPlanRecord;
use crate::patient::PatientRecord;
use crate::provider::ProviderRecord;

/// Read access to the records a claim document is assembled from
///
/// Lookups are fail-fast: an adapter returns the record, `PortError::NotFound`,
/// or another `PortError` without retrying internally.
#[async_trait]
pub trait ClaimRecordsPort: DomainPort + HealthCheckable {
    /// Retrieves a claim by ID
    async fn get_claim(&self, id: ClaimId) -> Result<ClaimRecord, PortError>;

    /// Retrieves a patient by ID
    async fn get_patient(&self, id: PatientId) -> Result<PatientRecord, PortError>;

    /// Retrieves a provider by ID
    async fn get_provider(&self, id: ProviderId) -> Result<ProviderRecord, PortError>;

    /// Retrieves a health plan by ID
    async fn get_health_plan(&self, id: HealthPlanId) -> Result<HealthPlanRecord, PortError>;
}
