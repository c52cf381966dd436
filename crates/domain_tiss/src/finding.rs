//! Validation findings
//!
//! Every diagnostic the validator produces is a [`ValidationFinding`] with a
//! shared `{severity, code, message, line, column}` shape. The typed
//! [`FindingKind`] travels alongside for callers that want to match on it;
//! only the flat shape is serialized.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::SchemaHandle;
use crate::xml::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Mandatory document sections checked independently of any schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Body,
    Footer,
    GuideIdentification,
    BeneficiaryData,
    ProviderData,
}

impl Section {
    pub const TOP_LEVEL: [Section; 3] = [Section::Header, Section::Body, Section::Footer];
    pub const WITHIN_BODY: [Section; 3] = [
        Section::GuideIdentification,
        Section::BeneficiaryData,
        Section::ProviderData,
    ];

    /// Stable suffix used in the `missing-section:*` code
    pub fn code(&self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Body => "body",
            Section::Footer => "footer",
            Section::GuideIdentification => "guide-identification",
            Section::BeneficiaryData => "beneficiary-data",
            Section::ProviderData => "provider-data",
        }
    }

    /// TISS element local name
    pub fn element(&self) -> &'static str {
        match self {
            Section::Header => "cabecalho",
            Section::Body => "corpo",
            Section::Footer => "rodape",
            Section::GuideIdentification => "identificacaoGuia",
            Section::BeneficiaryData => "dadosBeneficiario",
            Section::ProviderData => "dadosPrestador",
        }
    }
}

/// What a finding is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    MalformedXml,
    UnexpectedRoot,
    MissingNamespace,
    VersionMismatch,
    MissingSection(Section),
    /// Schema constraint violation, named by its XSD constraint code
    SchemaViolation(&'static str),
    /// Validation ran with the synthesized fallback schema
    SchemaFallback,
    /// The schema uses constructs the engine does not enforce
    SchemaIncomplete,
}

impl FindingKind {
    pub fn code(&self) -> String {
        match self {
            FindingKind::MalformedXml => "malformed-xml".to_string(),
            FindingKind::UnexpectedRoot => "unexpected-root".to_string(),
            FindingKind::MissingNamespace => "missing-namespace".to_string(),
            FindingKind::VersionMismatch => "version-mismatch".to_string(),
            FindingKind::MissingSection(section) => format!("missing-section:{}", section.code()),
            FindingKind::SchemaViolation(constraint) => (*constraint).to_string(),
            FindingKind::SchemaFallback => "schema-fallback".to_string(),
            FindingKind::SchemaIncomplete => "schema-incomplete".to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::SchemaFallback | FindingKind::SchemaIncomplete => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// One structured diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    /// 1-based, 0 when unknown
    pub line: u32,
    /// 1-based, 0 when unknown
    pub column: u32,
    #[serde(skip)]
    pub kind: FindingKind,
}

impl ValidationFinding {
    pub fn new(kind: FindingKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            severity: kind.severity(),
            code: kind.code(),
            message: message.into(),
            line: position.line,
            column: position.column,
            kind,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}:{}: {}",
            self.severity, self.code, self.line, self.column, self.message
        )
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// True iff no finding has error severity
    pub is_valid: bool,
    pub findings: Vec<ValidationFinding>,
    /// Schema applied in the schema-conformance stage, if that stage ran
    pub schema_used: Option<SchemaHandle>,
}

impl ValidationResult {
    pub fn from_findings(findings: Vec<ValidationFinding>, schema_used: Option<SchemaHandle>) -> Self {
        Self {
            is_valid: !findings.iter().any(ValidationFinding::is_error),
            findings,
            schema_used,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(FindingKind::MissingSection(Section::Body).code(), "missing-section:body");
        assert_eq!(
            FindingKind::MissingSection(Section::GuideIdentification).code(),
            "missing-section:guide-identification"
        );
        assert_eq!(FindingKind::SchemaViolation("cvc-elt.1").code(), "cvc-elt.1");
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let result = ValidationResult::from_findings(
            vec![ValidationFinding::new(
                FindingKind::SchemaFallback,
                "fallback schema in use",
                Position::UNKNOWN,
            )],
            None,
        );
        assert!(result.is_valid);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let finding = ValidationFinding::new(
            FindingKind::MalformedXml,
            "unexpected end of input",
            Position::new(3, 7),
        );
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "severity": "error",
                "code": "malformed-xml",
                "message": "unexpected end of input",
                "line": 3,
                "column": 7
            })
        );
    }
}
