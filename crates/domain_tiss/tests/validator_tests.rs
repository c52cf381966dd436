//! Integration tests for the three-stage document validator

use chrono::Utc;

use domain_tiss::{
    render_fallback_xsd, DocumentValidator, SchemaHandle, SchemaSource, Severity, TissEncoder,
    ValidationOptions, FALLBACK_VERSION,
};
use test_utils::{ClaimBundleBuilder, TemporalFixtures};

fn generated() -> String {
    TissEncoder::default()
        .encode(&ClaimBundleBuilder::new().build(), TemporalFixtures::processing_date())
        .unwrap()
}

/// The fallback table compiled as if it had been downloaded
fn official() -> SchemaHandle {
    SchemaHandle::official("3.05.00", &render_fallback_xsd(), None, Utc::now()).unwrap()
}

fn codes(result: &domain_tiss::ValidationResult) -> Vec<&str> {
    result.findings.iter().map(|f| f.code.as_str()).collect()
}

#[test]
fn test_generated_document_is_valid_against_official_schema() {
    let result = DocumentValidator::default().validate(&generated(), Some(&official()));
    assert!(result.is_valid);
    assert!(result.findings.is_empty(), "{:?}", result.findings);
    let used = result.schema_used.unwrap();
    assert_eq!(used.source_kind, SchemaSource::Official);
    assert_eq!(used.version, "3.05.00");
}

#[test]
fn test_truncated_document_is_malformed() {
    let xml = generated();
    let truncated = &xml[..xml.len() / 2];
    let result = DocumentValidator::default().validate(truncated, Some(&official()));
    assert!(!result.is_valid);
    assert_eq!(codes(&result), ["malformed-xml"]);
    assert!(result.findings[0].line > 0);
    assert!(result.schema_used.is_none());
}

#[test]
fn test_empty_input_is_malformed() {
    let result = DocumentValidator::default().validate("", None);
    assert_eq!(codes(&result), ["malformed-xml"]);
}

#[test]
fn test_missing_body_is_reported_by_structure_and_schema() {
    let xml = generated();
    let start = xml.find("<ans:corpo>").unwrap();
    let end = xml.find("</ans:corpo>").unwrap() + "</ans:corpo>".len();
    let without_body = format!("{}{}", &xml[..start], &xml[end..]);

    let result = DocumentValidator::default().validate(&without_body, Some(&official()));
    assert!(!result.is_valid);
    assert_eq!(codes(&result)[0], "missing-section:body");
    assert!(result.has_code("cvc-complex-type.2.4.a"));
}

#[test]
fn test_wrong_version_is_an_error() {
    let xml = generated().replace("version=\"3.05.00\"", "version=\"3.04.01\"");
    let result = DocumentValidator::default().validate(&xml, None);
    assert_eq!(codes(&result), ["version-mismatch"]);
    assert!(!result.is_valid);
}

#[test]
fn test_bad_value_is_located() {
    let xml = generated().replace("<ans:sexo>F</ans:sexo>", "<ans:sexo>X</ans:sexo>");
    let line = xml
        .lines()
        .position(|l| l.contains("<ans:sexo>"))
        .map(|i| i as u32 + 1)
        .unwrap();

    let result = DocumentValidator::default().validate(&xml, Some(&official()));
    assert!(!result.is_valid);
    let finding = result
        .findings
        .iter()
        .find(|f| f.code == "cvc-enumeration-valid")
        .unwrap();
    assert_eq!(finding.line, line);
    assert!(finding.column > 1);
}

#[test]
fn test_fallback_warns_without_running_schema_stage() {
    let fallback = SchemaHandle::fallback(None, Utc::now());
    let xml = generated().replace("<ans:sexo>F</ans:sexo>", "<ans:sexo>X</ans:sexo>");

    let result = DocumentValidator::default().validate(&xml, Some(&fallback));
    assert!(result.is_valid);
    assert_eq!(codes(&result), ["schema-fallback"]);
    assert_eq!(result.findings[0].severity, Severity::Warning);
    assert!(result.findings[0].message.contains(FALLBACK_VERSION));
    assert!(result.schema_used.is_none());
}

#[test]
fn test_fallback_opt_in_enforces_fallback_schema() {
    let fallback = SchemaHandle::fallback(None, Utc::now());
    let xml = generated().replace("<ans:sexo>F</ans:sexo>", "<ans:sexo>X</ans:sexo>");

    let validator = DocumentValidator::new(ValidationOptions {
        validate_with_fallback: true,
    });
    let result = validator.validate(&xml, Some(&fallback));
    assert!(!result.is_valid);
    assert_eq!(codes(&result), ["cvc-enumeration-valid", "schema-fallback"]);
    assert!(result.schema_used.unwrap().is_fallback());
}

#[test]
fn test_unknown_document_fails_every_stage() {
    let result = DocumentValidator::default().validate("<invoice><total>1</total></invoice>", Some(&official()));
    assert!(!result.is_valid);
    assert_eq!(codes(&result), ["unexpected-root", "missing-namespace", "cvc-elt.1"]);
}

#[test]
fn test_findings_serialize_without_internal_kind() {
    let result = DocumentValidator::default().validate("<a>", None);
    let json = serde_json::to_value(&result).unwrap();
    let finding = &json["findings"][0];
    assert_eq!(finding["code"], "malformed-xml");
    assert_eq!(finding["severity"], "error");
    assert!(finding.get("kind").is_none());
    assert_eq!(json["is_valid"], false);
}
