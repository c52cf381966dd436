//! Domain Snapshot Assembler
//!
//! Resolves a claim and the three records it references into a
//! [`ClaimBundle`]. Only presence is checked here; identifier lengths are
//! enforced by parsing into [`Cpf`]/[`Cnpj`], everything else about content
//! is left to the encoder and to whoever created the records.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use core_kernel::{ClaimId, Cnpj, Cpf, Currency, Money};

use crate::bundle::{
    BundleClaim, BundlePatient, BundlePlan, BundleProvider, ClaimBundle, OperatorIdentity,
};
use crate::error::ClaimError;
use crate::patient::Gender;
use crate::ports::ClaimRecordsPort;

/// Builds claim bundles from the record store
#[derive(Clone)]
pub struct ClaimBundleAssembler {
    records: Arc<dyn ClaimRecordsPort>,
    operator: OperatorIdentity,
}

fn required(
    entity: &'static str,
    id: i64,
    field: &'static str,
    value: Option<String>,
) -> Result<String, ClaimError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ClaimError::incomplete(entity, id, field, "value is missing")),
    }
}

impl ClaimBundleAssembler {
    pub fn new(records: Arc<dyn ClaimRecordsPort>, operator: OperatorIdentity) -> Self {
        Self { records, operator }
    }

    pub fn operator(&self) -> &OperatorIdentity {
        &self.operator
    }

    /// Reads the claim and its patient, provider and plan
    ///
    /// # Returns
    ///
    /// * `Err(ClaimError::NotFound)` if any of the four records is absent
    /// * `Err(ClaimError::IncompleteRecord)` if a field the encoder needs is
    ///   missing or an identifier has the wrong number of digits
    #[instrument(skip(self, claim_id), fields(claim_id = %claim_id))]
    pub async fn assemble(&self, claim_id: ClaimId) -> Result<ClaimBundle, ClaimError> {
        let claim = self
            .records
            .get_claim(claim_id)
            .await
            .map_err(|e| ClaimError::from_port("Claim", claim_id.value(), e))?;

        let (patient, provider, plan) = tokio::join!(
            self.records.get_patient(claim.patient_id),
            self.records.get_provider(claim.provider_id),
            self.records.get_health_plan(claim.plan_id),
        );
        let patient = patient.map_err(|e| ClaimError::from_port("Patient", claim.patient_id.value(), e))?;
        let provider = provider.map_err(|e| ClaimError::from_port("Provider", claim.provider_id.value(), e))?;
        let plan = plan.map_err(|e| ClaimError::from_port("HealthPlan", claim.plan_id.value(), e))?;

        let cid = claim.id.value();
        let value = Money::positive(claim.value, Currency::BRL)
            .map_err(|e| ClaimError::incomplete("Claim", cid, "value", e.to_string()))?;
        let bundle_claim = BundleClaim {
            id: claim.id,
            procedure_code: required("Claim", cid, "procedure_code", claim.procedure_code)?,
            diagnosis_code: required("Claim", cid, "diagnosis_code", claim.diagnosis_code)?,
            service_date: claim.claim_date,
            value,
            description: claim.description.filter(|d| !d.trim().is_empty()),
            status: claim.status,
        };

        let pid = patient.id.value();
        let cpf = required("Patient", pid, "cpf", patient.cpf)?;
        let cpf = Cpf::parse(&cpf)
            .map_err(|e| ClaimError::incomplete("Patient", pid, "cpf", e.to_string()))?;
        if !cpf.has_valid_check_digits() {
            warn!(patient_id = pid, "Patient CPF has invalid check digits");
        }
        let bundle_patient = BundlePatient {
            id: patient.id,
            cpf,
            name: required("Patient", pid, "name", patient.name)?,
            birth_date: patient
                .birth_date
                .ok_or_else(|| ClaimError::incomplete("Patient", pid, "birth_date", "value is missing"))?,
            gender: Gender::from_label(patient.gender.as_deref()),
        };

        let prid = provider.id.value();
        let cnpj = required("Provider", prid, "cnpj", provider.cnpj)?;
        let cnpj = Cnpj::parse(&cnpj)
            .map_err(|e| ClaimError::incomplete("Provider", prid, "cnpj", e.to_string()))?;
        if !cnpj.has_valid_check_digits() {
            warn!(provider_id = prid, "Provider CNPJ has invalid check digits");
        }
        let bundle_provider = BundleProvider {
            id: provider.id,
            cnpj,
            name: required("Provider", prid, "name", provider.name)?,
            provider_type: provider.provider_type,
        };

        let bundle_plan = BundlePlan {
            id: plan.id,
            registration_number: required(
                "HealthPlan",
                plan.id.value(),
                "registration_number",
                plan.registration_number,
            )?,
            name: plan.name,
        };

        let bundle = ClaimBundle::new(
            bundle_claim,
            bundle_patient,
            bundle_provider,
            bundle_plan,
            self.operator.clone(),
        )?;
        debug!("Claim bundle assembled");
        Ok(bundle)
    }
}
