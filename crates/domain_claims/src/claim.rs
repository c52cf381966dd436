//! Claim record

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ClaimId, HealthPlanId, PatientId, ProviderId};
use crate::error::ClaimError;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Submitted, awaiting a decision
    #[default]
    Pending,
    /// Approved for payment
    Approved,
    /// Denied by the operator
    Denied,
    /// Paid
    Paid,
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Denied => "denied",
            ClaimStatus::Paid => "paid",
        };
        f.write_str(label)
    }
}

/// A claim as held by the record store
///
/// Procedure and diagnosis codes are nullable in storage; the assembler
/// rejects claims without them because the TISS guide requires both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: ClaimId,
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub plan_id: HealthPlanId,
    #[serde(default)]
    pub procedure_code: Option<String>,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    /// Date the service was rendered
    pub claim_date: NaiveDate,
    pub value: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ClaimStatus,
}

impl ClaimRecord {
    pub fn is_pending(&self) -> bool {
        self.status == ClaimStatus::Pending
    }

    pub fn is_paid(&self) -> bool {
        self.status == ClaimStatus::Paid
    }

    /// Approves a pending claim
    pub fn approve(&mut self) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::Approved)
    }

    /// Denies a pending claim
    pub fn deny(&mut self) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::Denied)
    }

    /// Marks an approved claim as paid
    pub fn mark_paid(&mut self) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::Paid)
    }

    fn transition(&mut self, target: ClaimStatus) -> Result<(), ClaimError> {
        use ClaimStatus::*;
        let allowed = matches!(
            (self.status, target),
            (Pending, Approved) | (Pending, Denied) | (Approved, Paid)
        );
        if !allowed {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }
}
