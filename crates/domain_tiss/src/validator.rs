//! Document Validator
//!
//! Three sequential stages:
//!
//! 1. well-formedness: a parse failure yields exactly one `malformed-xml`
//!    finding and stops;
//! 2. structural checks, always run (see [`check_structure`]);
//! 3. schema conformance, run for official schemas, and for the fallback
//!    only when [`ValidationOptions::validate_with_fallback`] is set.
//!
//! Findings come back stage by stage, each stage in document order, followed
//! by the provenance warnings. Validation never fails; every problem is a
//! finding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::finding::{FindingKind, ValidationFinding, ValidationResult};
use crate::schema::SchemaHandle;
use crate::structure::check_structure;
use crate::xml::{Position, XmlDocument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Run schema conformance against the synthesized fallback as well
    #[serde(default)]
    pub validate_with_fallback: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentValidator {
    options: ValidationOptions,
}

impl DocumentValidator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn validate(&self, xml: &str, schema: Option<&SchemaHandle>) -> ValidationResult {
        let document = match XmlDocument::parse(xml) {
            Ok(document) => document,
            Err(e) => {
                debug!(line = e.position.line, column = e.position.column, "Document is not well-formed");
                let finding = ValidationFinding::new(FindingKind::MalformedXml, e.message, e.position);
                return ValidationResult::from_findings(vec![finding], None);
            }
        };

        let mut findings = check_structure(document.root());
        let mut schema_used = None;

        if let Some(handle) = schema {
            if handle.is_official() || self.options.validate_with_fallback {
                findings.extend(handle.schema().validate(&document));
                if !handle.unsupported.is_empty() {
                    findings.push(ValidationFinding::new(
                        FindingKind::SchemaIncomplete,
                        format!(
                            "Schema {} uses constructs that were not enforced: {}",
                            handle.version,
                            handle.unsupported.join("; ")
                        ),
                        Position::UNKNOWN,
                    ));
                }
                schema_used = Some(handle.clone());
            }
            if handle.is_fallback() {
                findings.push(ValidationFinding::new(
                    FindingKind::SchemaFallback,
                    format!(
                        "Official TISS schema unavailable; fallback schema {} in use",
                        handle.version
                    ),
                    Position::UNKNOWN,
                ));
            }
        }

        let result = ValidationResult::from_findings(findings, schema_used);
        debug!(
            is_valid = result.is_valid,
            findings = result.findings.len(),
            "Document validated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_malformed_input_yields_single_finding() {
        let validator = DocumentValidator::default();
        let fallback = SchemaHandle::fallback(None, Utc::now());
        let result = validator.validate("<not valid xml", Some(&fallback));
        assert!(!result.is_valid);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].code, "malformed-xml");
        assert_eq!(result.findings[0].line, 1);
        assert!(result.schema_used.is_none());
    }

    #[test]
    fn test_fallback_skips_schema_stage_by_default() {
        let validator = DocumentValidator::default();
        let fallback = SchemaHandle::fallback(None, Utc::now());
        let result = validator.validate(
            "<ans:mensagemTISS xmlns:ans=\"http://www.ans.gov.br/padroes/tiss/schemas\" version=\"3.05.00\"/>",
            Some(&fallback),
        );
        let codes: Vec<_> = result.findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(
            codes,
            [
                "missing-section:header",
                "missing-section:body",
                "missing-section:footer",
                "schema-fallback"
            ]
        );
        assert!(result.schema_used.is_none());
    }

    #[test]
    fn test_opt_in_runs_fallback_schema() {
        let validator = DocumentValidator::new(ValidationOptions {
            validate_with_fallback: true,
        });
        let fallback = SchemaHandle::fallback(None, Utc::now());
        let result = validator.validate(
            "<ans:mensagemTISS xmlns:ans=\"http://www.ans.gov.br/padroes/tiss/schemas\" version=\"3.05.00\"/>",
            Some(&fallback),
        );
        assert!(result.has_code("cvc-complex-type.2.4.b"));
        assert!(result.has_code("schema-fallback"));
        assert!(result.schema_used.is_some());
    }

    #[test]
    fn test_incomplete_official_schema_warns() {
        let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:include schemaLocation="tissComplexTypesV3_05_00.xsd"/>
            <xs:element name="doc" type="xs:string"/>
        </xs:schema>"#;
        let handle = SchemaHandle::official("3.05.00", schema, None, Utc::now()).unwrap();
        let result = DocumentValidator::default().validate("<doc>text</doc>", Some(&handle));
        assert!(result.has_code("schema-incomplete"));
        assert_eq!(result.warnings().count(), 1);
        assert!(!result.has_code("cvc-elt.1"));
    }

    #[test]
    fn test_without_schema_only_structure_runs() {
        let result = DocumentValidator::default().validate("<root/>", None);
        let codes: Vec<_> = result.findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, ["unexpected-root", "missing-namespace"]);
        assert!(result.schema_used.is_none());
    }
}
