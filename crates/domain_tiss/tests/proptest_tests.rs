//! Property-based tests for encoding and validation

use chrono::Utc;
use proptest::prelude::*;

use domain_tiss::{
    DocumentValidator, SchemaHandle, TissEncoder, ValidationOptions, XmlDocument, TISS_NAMESPACE,
};
use test_utils::{claim_bundle_strategy, positive_decimal_strategy, TemporalFixtures};

fn encode(bundle: &domain_claims::ClaimBundle) -> String {
    TissEncoder::default()
        .encode(bundle, TemporalFixtures::processing_date())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encoding_is_deterministic(bundle in claim_bundle_strategy()) {
        prop_assert_eq!(encode(&bundle), encode(&bundle));
    }

    #[test]
    fn generated_documents_pass_structure(bundle in claim_bundle_strategy()) {
        let result = DocumentValidator::default().validate(&encode(&bundle), None);
        prop_assert!(result.is_valid, "{:?}", result.findings);
        prop_assert!(result.findings.is_empty());
    }

    #[test]
    fn generated_documents_pass_fallback_schema(bundle in claim_bundle_strategy()) {
        let fallback = SchemaHandle::fallback(None, Utc::now());
        let validator = DocumentValidator::new(ValidationOptions { validate_with_fallback: true });
        let result = validator.validate(&encode(&bundle), Some(&fallback));
        prop_assert!(result.is_valid, "{:?}", result.findings);
        prop_assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn text_values_survive_a_parse(bundle in claim_bundle_strategy()) {
        let xml = encode(&bundle);
        let document = XmlDocument::parse(&xml).unwrap();
        let ns = Some(TISS_NAMESPACE);
        let beneficiary = document
            .root()
            .descendants()
            .find(|e| e.name().is(ns, "dadosBeneficiario"))
            .unwrap();
        prop_assert_eq!(
            beneficiary.child(ns, "nomeBeneficiario").unwrap().text(),
            bundle.patient().name.as_str()
        );
    }

    #[test]
    fn amounts_always_have_two_decimals(amount in positive_decimal_strategy()) {
        let bundle = test_utils::ClaimBundleBuilder::new().with_value(amount).build();
        let xml = encode(&bundle);
        let start = xml.find("<ans:valorProcedimento>").unwrap() + "<ans:valorProcedimento>".len();
        let end = xml[start..].find('<').unwrap() + start;
        let value = &xml[start..end];
        let (_, decimals) = value.split_once('.').unwrap();
        prop_assert_eq!(decimals.len(), 2);
    }
}
