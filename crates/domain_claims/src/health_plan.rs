//! Health plan record

use serde::{Deserialize, Serialize};

use core_kernel::HealthPlanId;

/// A health plan as held by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPlanRecord {
    pub id: HealthPlanId,
    pub name: String,
    #[serde(default)]
    pub operator_code: Option<String>,
    /// ANS registration number of the plan
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
