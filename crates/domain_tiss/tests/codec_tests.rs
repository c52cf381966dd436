//! Integration tests for the codec facade

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;

use core_kernel::{ClaimId, FixedClock};
use domain_claims::{ClaimBundleAssembler, InMemoryClaimRecords};
use domain_tiss::{
    render_fallback_xsd, SchemaHandle, SchemaProvider, StaticSchemaProvider, TissCodec, TissError,
};
use test_utils::{
    ClaimRecordBuilder, IdFixtures, OperatorFixtures, RecordFixtures, TemporalFixtures,
};

fn official_provider() -> Arc<dyn SchemaProvider> {
    let handle = SchemaHandle::official("3.05.00", &render_fallback_xsd(), None, Utc::now()).unwrap();
    Arc::new(StaticSchemaProvider::new(handle))
}

fn codec_with(store: InMemoryClaimRecords, schemas: Arc<dyn SchemaProvider>) -> TissCodec {
    let assembler = ClaimBundleAssembler::new(Arc::new(store), OperatorFixtures::operator());
    TissCodec::new(assembler, schemas)
        .with_clock(Arc::new(FixedClock::new(TemporalFixtures::generated_at())))
}

fn codec() -> TissCodec {
    codec_with(
        InMemoryClaimRecords::from_snapshot(RecordFixtures::snapshot()),
        official_provider(),
    )
}

#[tokio::test]
async fn test_generate_with_validation() {
    let document = codec()
        .generate_with_validation(IdFixtures::claim_id())
        .await
        .unwrap();

    assert!(document.is_valid(), "{:?}", document.validation.findings);
    assert!(document.validation.findings.is_empty());
    assert_eq!(document.claim_id, IdFixtures::claim_id());
    assert_eq!(document.filename, "tiss_claim_1_20240120_143000.xml");
    assert_eq!(document.generated_at, TemporalFixtures::generated_at());
    assert!(document
        .xml
        .contains("<ans:dataProcessamento>2024-01-20</ans:dataProcessamento>"));
    assert!(document.xml.contains("<ans:valorProcedimento>300.50</ans:valorProcedimento>"));
    assert!(document.schema.is_official());
}

#[tokio::test]
async fn test_generation_is_repeatable_under_fixed_clock() {
    let codec = codec();
    let first = codec.generate_with_validation(IdFixtures::claim_id()).await.unwrap();
    let second = codec.generate_with_validation(IdFixtures::claim_id()).await.unwrap();
    assert_eq!(first.xml, second.xml);
}

#[tokio::test]
async fn test_unknown_claim_is_not_found() {
    let error = codec()
        .generate_with_validation(IdFixtures::unknown_claim_id())
        .await
        .unwrap_err();
    assert!(error.is_not_found());
    assert!(matches!(error, TissError::Claim(_)));
}

#[tokio::test]
async fn test_incomplete_claim_is_rejected() {
    let store = InMemoryClaimRecords::from_snapshot(RecordFixtures::snapshot());
    store
        .insert_claim(
            ClaimRecordBuilder::new()
                .with_id(ClaimId::new(2))
                .with_diagnosis_code(None)
                .build(),
        )
        .await;

    let error = codec_with(store, official_provider())
        .generate_with_validation(ClaimId::new(2))
        .await
        .unwrap_err();
    assert!(error.is_incomplete());
    assert!(!error.is_not_found());
}

#[tokio::test]
async fn test_fallback_schema_marks_document() {
    let codec = codec_with(
        InMemoryClaimRecords::from_snapshot(RecordFixtures::snapshot()),
        Arc::new(StaticSchemaProvider::fallback()),
    );
    let document = codec.generate_with_validation(IdFixtures::claim_id()).await.unwrap();
    assert!(document.is_valid());
    assert!(document.validation.has_code("schema-fallback"));
    assert!(document.schema.is_fallback());
    assert!(document.validation.schema_used.is_none());
}

#[tokio::test]
async fn test_validate_only_round_trips_generated_document() {
    let codec = codec();
    let document = codec.generate_with_validation(IdFixtures::claim_id()).await.unwrap();
    let result = codec.validate_only(&document.xml).await;
    assert!(result.is_valid);

    let broken = codec.validate_only("<ans:mensagemTISS").await;
    assert_eq!(broken.findings.len(), 1);
    assert_eq!(broken.findings[0].code, "malformed-xml");
}

#[tokio::test]
async fn test_validate_file() {
    let codec = codec();
    let document = codec.generate_with_validation(IdFixtures::claim_id()).await.unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(document.xml.as_bytes()).unwrap();

    let result = codec.validate_file(file.path()).await.unwrap();
    assert!(result.is_valid);
}

#[tokio::test]
async fn test_non_utf8_bytes_are_malformed() {
    let result = codec().validate_bytes(b"<a>\n  \xe9</a>").await;
    assert!(!result.is_valid);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].code, "malformed-xml");
    assert_eq!((result.findings[0].line, result.findings[0].column), (2, 3));
    assert!(result.schema_used.is_none());
}

#[tokio::test]
async fn test_validate_latin1_file_reports_finding() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"<?xml version=\"1.0\"?><nome>Jos\xe9</nome>").unwrap();

    let result = codec().validate_file(file.path()).await.unwrap();
    assert!(!result.is_valid);
    assert!(result.has_code("malformed-xml"));
}

#[tokio::test]
async fn test_validate_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = codec()
        .validate_file(dir.path().join("absent.xml"))
        .await
        .unwrap_err();
    assert!(matches!(error, TissError::Io { .. }));
}

#[tokio::test]
async fn test_schema_info() {
    let info = codec().schema_info().await;
    assert!(info.is_official());
    assert_eq!(info.version, "3.05.00");
    assert_eq!(info.root_elements, ["mensagemTISS"]);
    assert_eq!(info.size_bytes, render_fallback_xsd().len() as u64);
}
