//! TISS handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use core_kernel::ClaimId;
use domain_tiss::{SchemaHandle, ValidationResult};

use crate::dto::tiss::GenerateResponse;
use crate::{error::ApiError, AppState};

fn parse_claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid claim id '{raw}'")))
}

/// Generates and validates the document for a claim
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let claim_id = parse_claim_id(&id)?;
    let document = state.codec.generate_with_validation(claim_id).await?;
    Ok(Json(GenerateResponse::new(document)))
}

/// Returns the document as an XML attachment, refusing invalid ones
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let claim_id = parse_claim_id(&id)?;
    let document = state.codec.generate_with_validation(claim_id).await?;
    if !document.is_valid() {
        return Err(ApiError::InvalidDocument(document.validation.findings));
    }

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.xml,
    )
        .into_response())
}

/// Validates a raw XML body; a body that is not UTF-8 yields a malformed-xml finding
pub async fn validate(State(state): State<AppState>, body: Bytes) -> Json<ValidationResult> {
    Json(state.codec.validate_bytes(&body).await)
}

/// Metadata of the schema in use
pub async fn schema_info(State(state): State<AppState>) -> Json<SchemaHandle> {
    Json(SchemaHandle::clone(&*state.codec.schema_info().await))
}
