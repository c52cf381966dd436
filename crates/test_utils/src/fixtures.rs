//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claim records and identities. Every fixture refers to
//! the same claim (id 1) and its patient, provider and plan, so a snapshot of
//! all four assembles into a complete bundle.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, Cnpj, Cpf, HealthPlanId, Money, PatientId, ProviderId};
use domain_claims::{
    ClaimRecord, ClaimStatus, HealthPlanRecord, OperatorIdentity, PatientRecord, ProviderRecord,
    ProviderType, RecordSnapshot,
};

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn claim_id() -> ClaimId {
        ClaimId::new(1)
    }

    pub fn patient_id() -> PatientId {
        PatientId::new(10)
    }

    pub fn provider_id() -> ProviderId {
        ProviderId::new(20)
    }

    pub fn plan_id() -> HealthPlanId {
        HealthPlanId::new(30)
    }

    /// A claim id no fixture store holds
    pub fn unknown_claim_id() -> ClaimId {
        ClaimId::new(999)
    }
}

/// Fixture for national identifiers; all carry valid check digits
pub struct NationalIdFixtures;

impl NationalIdFixtures {
    pub fn cpf_text() -> &'static str {
        "987.654.321-00"
    }

    pub fn cnpj_text() -> &'static str {
        "11.222.333/0001-81"
    }

    pub fn cpf() -> Cpf {
        Cpf::parse(Self::cpf_text()).unwrap()
    }

    pub fn cnpj() -> Cnpj {
        Cnpj::parse(Self::cnpj_text()).unwrap()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Date the fixture service was rendered
    pub fn service_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
    }

    /// Service date plus the 30 day password validity
    pub fn password_expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    pub fn birth_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 5, 1).unwrap()
    }

    pub fn processing_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
    }

    /// Instant documents are generated at in clock-driven tests
    pub fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 14, 30, 0).unwrap()
    }
}

/// Fixture for amounts
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Claim value with a single decimal place, written as `300.50`
    pub fn claim_value() -> Money {
        Money::brl(dec!(300.5))
    }

    pub fn round_value() -> Money {
        Money::brl(dec!(150))
    }
}

/// Fixture for the issuing operator
pub struct OperatorFixtures;

impl OperatorFixtures {
    pub fn operator() -> OperatorIdentity {
        OperatorIdentity::new("OP001", "ANS-654321")
    }
}

/// Fixture for stored records
pub struct RecordFixtures;

impl RecordFixtures {
    pub fn claim() -> ClaimRecord {
        ClaimRecord {
            id: IdFixtures::claim_id(),
            patient_id: IdFixtures::patient_id(),
            provider_id: IdFixtures::provider_id(),
            plan_id: IdFixtures::plan_id(),
            procedure_code: Some("PROC-002".to_string()),
            diagnosis_code: Some("J45".to_string()),
            claim_date: TemporalFixtures::service_date(),
            value: MoneyFixtures::claim_value().amount(),
            description: Some("Consulta em consultório".to_string()),
            status: ClaimStatus::Pending,
        }
    }

    pub fn patient() -> PatientRecord {
        PatientRecord {
            id: IdFixtures::patient_id(),
            name: Some("Maria Silva".to_string()),
            cpf: Some(NationalIdFixtures::cpf_text().to_string()),
            birth_date: Some(TemporalFixtures::birth_date()),
            gender: Some("female".to_string()),
        }
    }

    pub fn provider() -> ProviderRecord {
        ProviderRecord {
            id: IdFixtures::provider_id(),
            name: Some("Hospital Central".to_string()),
            cnpj: Some(NationalIdFixtures::cnpj_text().to_string()),
            provider_type: ProviderType::Hospital,
        }
    }

    pub fn plan() -> HealthPlanRecord {
        HealthPlanRecord {
            id: IdFixtures::plan_id(),
            name: "Plano Ouro".to_string(),
            operator_code: Some("OP001".to_string()),
            registration_number: Some("ANS-123456".to_string()),
            active: true,
        }
    }

    /// All four fixture records
    pub fn snapshot() -> RecordSnapshot {
        RecordSnapshot {
            claims: vec![Self::claim()],
            patients: vec![Self::patient()],
            providers: vec![Self::provider()],
            health_plans: vec![Self::plan()],
        }
    }

    /// The fixture snapshot as seed JSON
    pub fn snapshot_json() -> String {
        serde_json::to_string_pretty(&Self::snapshot()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_ids_have_valid_check_digits() {
        assert!(NationalIdFixtures::cpf().has_valid_check_digits());
        assert!(NationalIdFixtures::cnpj().has_valid_check_digits());
    }

    #[test]
    fn test_records_reference_each_other() {
        let claim = RecordFixtures::claim();
        assert_eq!(claim.patient_id, RecordFixtures::patient().id);
        assert_eq!(claim.provider_id, RecordFixtures::provider().id);
        assert_eq!(claim.plan_id, RecordFixtures::plan().id);
    }

    #[test]
    fn test_snapshot_json_round_trips() {
        let parsed: RecordSnapshot = serde_json::from_str(&RecordFixtures::snapshot_json()).unwrap();
        assert_eq!(parsed.claims, vec![RecordFixtures::claim()]);
    }
}
