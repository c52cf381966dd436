//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! the fixture values for everything else.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{ClaimId, Cnpj, Cpf, HealthPlanId, Money, PatientId, ProviderId};
use domain_claims::{
    BundleClaim, BundlePatient, BundlePlan, BundleProvider, ClaimBundle, ClaimError, ClaimRecord,
    ClaimStatus, Gender, OperatorIdentity, ProviderType,
};

use crate::fixtures::{
    IdFixtures, MoneyFixtures, NationalIdFixtures, OperatorFixtures, RecordFixtures,
    TemporalFixtures,
};

/// Builder for encoder-ready claim bundles
#[derive(Debug, Clone)]
pub struct ClaimBundleBuilder {
    claim: BundleClaim,
    patient: BundlePatient,
    provider: BundleProvider,
    plan: BundlePlan,
    operator: OperatorIdentity,
}

impl Default for ClaimBundleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBundleBuilder {
    /// Creates a new builder holding the fixture claim
    pub fn new() -> Self {
        Self {
            claim: BundleClaim {
                id: IdFixtures::claim_id(),
                procedure_code: "PROC-002".to_string(),
                diagnosis_code: "J45".to_string(),
                service_date: TemporalFixtures::service_date(),
                value: MoneyFixtures::claim_value(),
                description: Some("Consulta em consultório".to_string()),
                status: ClaimStatus::Pending,
            },
            patient: BundlePatient {
                id: IdFixtures::patient_id(),
                cpf: NationalIdFixtures::cpf(),
                name: "Maria Silva".to_string(),
                birth_date: TemporalFixtures::birth_date(),
                gender: Gender::Female,
            },
            provider: BundleProvider {
                id: IdFixtures::provider_id(),
                cnpj: NationalIdFixtures::cnpj(),
                name: "Hospital Central".to_string(),
                provider_type: ProviderType::Hospital,
            },
            plan: BundlePlan {
                id: IdFixtures::plan_id(),
                name: "Plano Ouro".to_string(),
                registration_number: "ANS-123456".to_string(),
            },
            operator: OperatorFixtures::operator(),
        }
    }

    pub fn with_claim_id(mut self, id: ClaimId) -> Self {
        self.claim.id = id;
        self
    }

    pub fn with_procedure_code(mut self, code: impl Into<String>) -> Self {
        self.claim.procedure_code = code.into();
        self
    }

    pub fn with_diagnosis_code(mut self, code: impl Into<String>) -> Self {
        self.claim.diagnosis_code = code.into();
        self
    }

    pub fn with_service_date(mut self, date: NaiveDate) -> Self {
        self.claim.service_date = date;
        self
    }

    /// Sets the claim value in BRL
    pub fn with_value(mut self, amount: Decimal) -> Self {
        self.claim.value = Money::brl(amount);
        self
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.claim.description = description.map(str::to_string);
        self
    }

    pub fn with_patient_id(mut self, id: PatientId) -> Self {
        self.patient.id = id;
        self
    }

    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient.name = name.into();
        self
    }

    pub fn with_cpf(mut self, cpf: Cpf) -> Self {
        self.patient.cpf = cpf;
        self
    }

    pub fn with_birth_date(mut self, date: NaiveDate) -> Self {
        self.patient.birth_date = date;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.patient.gender = gender;
        self
    }

    pub fn with_provider_id(mut self, id: ProviderId) -> Self {
        self.provider.id = id;
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider.name = name.into();
        self
    }

    pub fn with_cnpj(mut self, cnpj: Cnpj) -> Self {
        self.provider.cnpj = cnpj;
        self
    }

    pub fn with_provider_type(mut self, provider_type: ProviderType) -> Self {
        self.provider.provider_type = provider_type;
        self
    }

    pub fn with_plan_id(mut self, id: HealthPlanId) -> Self {
        self.plan.id = id;
        self
    }

    pub fn with_plan_registration(mut self, registration: impl Into<String>) -> Self {
        self.plan.registration_number = registration.into();
        self
    }

    pub fn with_operator(mut self, operator: OperatorIdentity) -> Self {
        self.operator = operator;
        self
    }

    /// Builds the bundle, surfacing validation errors
    pub fn try_build(self) -> Result<ClaimBundle, ClaimError> {
        ClaimBundle::new(self.claim, self.patient, self.provider, self.plan, self.operator)
    }

    /// Builds the bundle
    ///
    /// # Panics
    ///
    /// Panics if the configured values do not form a complete bundle.
    pub fn build(self) -> ClaimBundle {
        match self.try_build() {
            Ok(bundle) => bundle,
            Err(e) => panic!("ClaimBundleBuilder produced an incomplete bundle: {e}"),
        }
    }
}

/// Builder for stored claim records, including incomplete ones
#[derive(Debug, Clone)]
pub struct ClaimRecordBuilder {
    record: ClaimRecord,
}

impl Default for ClaimRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimRecordBuilder {
    pub fn new() -> Self {
        Self {
            record: RecordFixtures::claim(),
        }
    }

    pub fn with_id(mut self, id: ClaimId) -> Self {
        self.record.id = id;
        self
    }

    pub fn with_patient_id(mut self, id: PatientId) -> Self {
        self.record.patient_id = id;
        self
    }

    pub fn with_provider_id(mut self, id: ProviderId) -> Self {
        self.record.provider_id = id;
        self
    }

    pub fn with_plan_id(mut self, id: HealthPlanId) -> Self {
        self.record.plan_id = id;
        self
    }

    pub fn with_procedure_code(mut self, code: Option<&str>) -> Self {
        self.record.procedure_code = code.map(str::to_string);
        self
    }

    pub fn with_diagnosis_code(mut self, code: Option<&str>) -> Self {
        self.record.diagnosis_code = code.map(str::to_string);
        self
    }

    pub fn with_claim_date(mut self, date: NaiveDate) -> Self {
        self.record.claim_date = date;
        self
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.record.value = value;
        self
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn build(self) -> ClaimRecord {
        self.record
    }
}
