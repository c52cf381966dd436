//! Claim bundle
//!
//! The fully resolved, encoder-ready aggregate of one claim and the patient,
//! provider and health plan it references, plus the operator identity the
//! document is issued under. Sub-records carry already-typed values (parsed
//! CPF/CNPJ, positive [`Money`]); [`ClaimBundle::new`] rejects blank text
//! fields so an encoder never sees a partial bundle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, Cnpj, Cpf, HealthPlanId, Money, PatientId, ProviderId};

use crate::claim::ClaimStatus;
use crate::error::ClaimError;
use crate::patient::Gender;
use crate::provider::ProviderType;

/// Claim portion of a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleClaim {
    pub id: ClaimId,
    pub procedure_code: String,
    pub diagnosis_code: String,
    pub service_date: NaiveDate,
    pub value: Money,
    pub description: Option<String>,
    pub status: ClaimStatus,
}

/// Beneficiary portion of a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePatient {
    pub id: PatientId,
    pub cpf: Cpf,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

/// Provider portion of a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleProvider {
    pub id: ProviderId,
    pub cnpj: Cnpj,
    pub name: String,
    pub provider_type: ProviderType,
}

/// Health plan portion of a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePlan {
    pub id: HealthPlanId,
    pub name: String,
    /// ANS registration of the plan, used as the provider-side `registroANS`
    pub registration_number: String,
}

/// Identity of the health-insurance operator issuing documents
///
/// Static configuration, never read from claim records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorIdentity {
    pub operator_code: String,
    pub ans_registration: String,
}

impl OperatorIdentity {
    pub fn new(operator_code: impl Into<String>, ans_registration: impl Into<String>) -> Self {
        Self {
            operator_code: operator_code.into(),
            ans_registration: ans_registration.into(),
        }
    }
}

/// Immutable, encoder-ready claim aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimBundle {
    claim: BundleClaim,
    patient: BundlePatient,
    provider: BundleProvider,
    plan: BundlePlan,
    operator: OperatorIdentity,
}

fn ensure_present(
    entity: &'static str,
    id: i64,
    field: &'static str,
    value: &str,
) -> Result<(), ClaimError> {
    if value.trim().is_empty() {
        return Err(ClaimError::incomplete(entity, id, field, "value is blank"));
    }
    Ok(())
}

impl ClaimBundle {
    /// Assembles a bundle, rejecting blank text fields and non-positive values
    pub fn new(
        claim: BundleClaim,
        patient: BundlePatient,
        provider: BundleProvider,
        plan: BundlePlan,
        operator: OperatorIdentity,
    ) -> Result<Self, ClaimError> {
        let claim_id = claim.id.value();
        ensure_present("Claim", claim_id, "procedure_code", &claim.procedure_code)?;
        ensure_present("Claim", claim_id, "diagnosis_code", &claim.diagnosis_code)?;
        if !claim.value.is_positive() {
            return Err(ClaimError::incomplete(
                "Claim",
                claim_id,
                "value",
                format!("{} is not a positive amount", claim.value),
            ));
        }
        ensure_present("Patient", patient.id.value(), "name", &patient.name)?;
        ensure_present("Provider", provider.id.value(), "name", &provider.name)?;
        ensure_present(
            "HealthPlan",
            plan.id.value(),
            "registration_number",
            &plan.registration_number,
        )?;
        ensure_present("Operator", 0, "operator_code", &operator.operator_code)?;
        ensure_present("Operator", 0, "ans_registration", &operator.ans_registration)?;

        Ok(Self {
            claim,
            patient,
            provider,
            plan,
            operator,
        })
    }

    pub fn claim(&self) -> &BundleClaim {
        &self.claim
    }

    pub fn patient(&self) -> &BundlePatient {
        &self.patient
    }

    pub fn provider(&self) -> &BundleProvider {
        &self.provider
    }

    pub fn plan(&self) -> &BundlePlan {
        &self.plan
    }

    pub fn operator(&self) -> &OperatorIdentity {
        &self.operator
    }
}
