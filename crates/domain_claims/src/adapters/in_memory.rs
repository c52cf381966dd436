//! In-memory record store

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, HealthPlanId,
    PatientId, PortError, ProviderId,
};

use crate::claim::ClaimRecord;
use crate::health_plan::HealthPlanRecord;
use crate::patient::PatientRecord;
use crate::ports::ClaimRecordsPort;
use crate::provider::ProviderRecord;

/// Serialized form of the whole store, used for seeding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSnapshot {
    #[serde(default)]
    pub claims: Vec<ClaimRecord>,
    #[serde(default)]
    pub patients: Vec<PatientRecord>,
    #[serde(default)]
    pub providers: Vec<ProviderRecord>,
    #[serde(default)]
    pub health_plans: Vec<HealthPlanRecord>,
}

#[derive(Debug, Default)]
struct Tables {
    claims: HashMap<ClaimId, ClaimRecord>,
    patients: HashMap<PatientId, PatientRecord>,
    providers: HashMap<ProviderId, ProviderRecord>,
    health_plans: HashMap<HealthPlanId, HealthPlanRecord>,
}

/// In-memory implementation of [`ClaimRecordsPort`]
#[derive(Debug, Default, Clone)]
pub struct InMemoryClaimRecords {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryClaimRecords {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding every record in `snapshot`
    pub fn from_snapshot(snapshot: RecordSnapshot) -> Self {
        let tables = Tables {
            claims: snapshot.claims.into_iter().map(|r| (r.id, r)).collect(),
            patients: snapshot.patients.into_iter().map(|r| (r.id, r)).collect(),
            providers: snapshot.providers.into_iter().map(|r| (r.id, r)).collect(),
            health_plans: snapshot.health_plans.into_iter().map(|r| (r.id, r)).collect(),
        };
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Parses a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, PortError> {
        let snapshot: RecordSnapshot = serde_json::from_str(json)
            .map_err(|e| PortError::transformation(format!("invalid record snapshot: {e}")))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Reads and parses a JSON snapshot file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PortError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PortError::internal(format!("cannot read record snapshot {}", path.display()), e)
        })?;
        let store = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "Loaded record snapshot");
        Ok(store)
    }

    pub async fn insert_claim(&self, record: ClaimRecord) {
        self.tables.write().await.claims.insert(record.id, record);
    }

    pub async fn insert_patient(&self, record: PatientRecord) {
        self.tables.write().await.patients.insert(record.id, record);
    }

    pub async fn insert_provider(&self, record: ProviderRecord) {
        self.tables.write().await.providers.insert(record.id, record);
    }

    pub async fn insert_health_plan(&self, record: HealthPlanRecord) {
        self.tables.write().await.health_plans.insert(record.id, record);
    }

    /// Number of claims currently held
    pub async fn claim_count(&self) -> usize {
        self.tables.read().await.claims.len()
    }
}

impl DomainPort for InMemoryClaimRecords {}

#[async_trait]
impl HealthCheckable for InMemoryClaimRecords {
    async fn health_check(&self) -> HealthCheckResult {
        let claims = self.claim_count().await;
        HealthCheckResult {
            adapter_id: "in-memory-claim-records".to_string(),
            status: AdapterHealth::Healthy,
            message: Some(format!("{claims} claims loaded")),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ClaimRecordsPort for InMemoryClaimRecords {
    async fn get_claim(&self, id: ClaimId) -> Result<ClaimRecord, PortError> {
        self.tables
            .read()
            .await
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    async fn get_patient(&self, id: PatientId) -> Result<PatientRecord, PortError> {
        self.tables
            .read()
            .await
            .patients
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Patient", id))
    }

    async fn get_provider(&self, id: ProviderId) -> Result<ProviderRecord, PortError> {
        self.tables
            .read()
            .await
            .providers
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Provider", id))
    }

    async fn get_health_plan(&self, id: HealthPlanId) -> Result<HealthPlanRecord, PortError> {
        self.tables
            .read()
            .await
            .health_plans
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("HealthPlan", id))
    }
}
