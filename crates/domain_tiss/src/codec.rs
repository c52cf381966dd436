//! Codec Facade
//!
//! Orchestrates Assembler -> Encoder -> Schema Provider -> Validator for the
//! "generate with validation" use case, and exposes standalone validation.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

use core_kernel::{ClaimId, Clock, SystemClock};
use domain_claims::ClaimBundleAssembler;

use crate::encoder::{suggested_filename, TissEncoder};
use crate::error::TissError;
use crate::finding::{FindingKind, ValidationFinding, ValidationResult};
use crate::schema::{SchemaHandle, SchemaProvider};
use crate::validator::DocumentValidator;
use crate::xml::Position;

/// A generated document together with its validation outcome
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub claim_id: ClaimId,
    pub xml: String,
    pub validation: ValidationResult,
    /// Suggested download file name
    pub filename: String,
    pub generated_at: DateTime<Utc>,
    /// Schema the document was validated against
    #[serde(skip)]
    pub schema: Arc<SchemaHandle>,
}

impl GeneratedDocument {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }
}

pub struct TissCodec {
    assembler: ClaimBundleAssembler,
    schemas: Arc<dyn SchemaProvider>,
    encoder: TissEncoder,
    validator: DocumentValidator,
    clock: Arc<dyn Clock>,
}

impl TissCodec {
    pub fn new(assembler: ClaimBundleAssembler, schemas: Arc<dyn SchemaProvider>) -> Self {
        Self {
            assembler,
            schemas,
            encoder: TissEncoder::default(),
            validator: DocumentValidator::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_encoder(mut self, encoder: TissEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_validator(mut self, validator: DocumentValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Clock the processing date and generation timestamp are read from
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn schemas(&self) -> &Arc<dyn SchemaProvider> {
        &self.schemas
    }

    /// Assembles, encodes and validates the document for one claim
    ///
    /// Assembly failures propagate unchanged. Validation problems are part of
    /// the returned document, never errors.
    #[instrument(skip(self, claim_id), fields(claim_id = %claim_id))]
    pub async fn generate_with_validation(&self, claim_id: ClaimId) -> Result<GeneratedDocument, TissError> {
        let bundle = self.assembler.assemble(claim_id).await?;

        let generated_at = self.clock.now();
        let xml = self
            .encoder
            .encode(&bundle, generated_at.date_naive())
            .inspect_err(|e| error!(error = %e, "Encoder rejected a complete claim bundle"))?;

        let schema = self.schemas.get_schema().await;
        let validation = self.validator.validate(&xml, Some(&schema));

        info!(
            is_valid = validation.is_valid,
            findings = validation.findings.len(),
            source_kind = %schema.source_kind,
            "TISS document generated"
        );

        Ok(GeneratedDocument {
            claim_id,
            xml,
            validation,
            filename: suggested_filename(claim_id, generated_at),
            generated_at,
            schema,
        })
    }

    /// Validates arbitrary XML text; never fails
    pub async fn validate_only(&self, xml: &str) -> ValidationResult {
        let schema = self.schemas.get_schema().await;
        self.validator.validate(xml, Some(&schema))
    }

    /// Validates raw bytes; input that is not UTF-8 is malformed XML
    pub async fn validate_bytes(&self, bytes: &[u8]) -> ValidationResult {
        match std::str::from_utf8(bytes) {
            Ok(xml) => self.validate_only(xml).await,
            Err(e) => {
                let valid = String::from_utf8_lossy(&bytes[..e.valid_up_to()]);
                let finding = ValidationFinding::new(
                    FindingKind::MalformedXml,
                    format!("invalid UTF-8 sequence at byte {}", e.valid_up_to()),
                    Position::at_offset(&valid, valid.len()),
                );
                ValidationResult::from_findings(vec![finding], None)
            }
        }
    }

    /// Reads a file and validates its content
    pub async fn validate_file(&self, path: impl AsRef<Path>) -> Result<ValidationResult, TissError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TissError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(self.validate_bytes(&bytes).await)
    }

    /// Metadata of the schema currently in use
    pub async fn schema_info(&self) -> Arc<SchemaHandle> {
        self.schemas.get_schema().await
    }
}
