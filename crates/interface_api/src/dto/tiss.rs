//! TISS DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::ClaimId;
use domain_tiss::{GeneratedDocument, SchemaHandle, SchemaSource, ValidationFinding};

/// Schema the document was checked against
#[derive(Debug, Serialize)]
pub struct SchemaSummary {
    pub source_kind: SchemaSource,
    pub version: String,
    pub digest: String,
}

impl From<&SchemaHandle> for SchemaSummary {
    fn from(handle: &SchemaHandle) -> Self {
        Self {
            source_kind: handle.source_kind,
            version: handle.version.clone(),
            digest: handle.digest.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub claim_id: ClaimId,
    pub xml_content: String,
    pub is_valid: bool,
    pub findings: Vec<ValidationFinding>,
    pub filename: String,
    pub generated_at: DateTime<Utc>,
    pub schema: SchemaSummary,
}

impl GenerateResponse {
    pub fn new(document: GeneratedDocument) -> Self {
        Self {
            claim_id: document.claim_id,
            is_valid: document.is_valid(),
            xml_content: document.xml,
            findings: document.validation.findings,
            filename: document.filename,
            generated_at: document.generated_at,
            schema: SchemaSummary::from(document.schema.as_ref()),
        }
    }
}
