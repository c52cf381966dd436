//! Integration tests for the TISS encoder

use rust_decimal_macros::dec;

use domain_claims::Gender;
use domain_tiss::{
    DocumentValidator, EncoderOptions, SchemaHandle, TissEncoder, ValidationOptions, XmlDocument,
    TISS_NAMESPACE,
};
use test_utils::{
    assert_in_order, assert_occurrences, ClaimBundleBuilder, TemporalFixtures,
};

fn encode(builder: ClaimBundleBuilder) -> String {
    TissEncoder::default()
        .encode(&builder.build(), TemporalFixtures::processing_date())
        .unwrap()
}

fn leaf(name: &str, value: &str) -> String {
    format!("<ans:{name}>{value}</ans:{name}>")
}

#[test]
fn test_reference_claim_document() {
    let xml = encode(ClaimBundleBuilder::new());

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(&format!(
        "<ans:mensagemTISS xmlns:ans=\"{TISS_NAMESPACE}\" version=\"3.05.00\">"
    )));
    assert!(xml.contains(&leaf("codigoProcedimento", "PROC-002")));
    assert!(xml.contains(&leaf("dataAutorizacao", "2024-01-16")));
    assert!(xml.contains(&leaf("dataProcedimento", "2024-01-16")));
    assert!(xml.contains(&leaf("dataValidadeSenha", "2024-02-15")));
    assert!(xml.contains(&leaf("sexo", "F")));
    assert!(xml.contains(&leaf("cpf", "987.654.321-00")));
    assert!(xml.contains(&leaf("senha", "123456")));
    assert!(xml.contains(&leaf("numeroCarteira", "10")));
    assert!(xml.contains(&leaf("dataProcessamento", "2024-01-20")));
    assert_occurrences(&xml, &leaf("numeroProtocolo", "1"), 1);
    assert_occurrences(&xml, &leaf("valorProcedimento", "300.50"), 1);
    assert_occurrences(&xml, &leaf("valorTotalGeral", "300.50"), 2);
    assert_occurrences(&xml, &leaf("cnpjPrestador", "11.222.333/0001-81"), 3);
}

#[test]
fn test_sections_follow_document_order() {
    let xml = encode(ClaimBundleBuilder::new());
    assert_in_order(
        &xml,
        &[
            "<ans:cabecalho>",
            "<ans:identificacaoOperadora>",
            "</ans:cabecalho>",
            "<ans:corpo>",
            "<ans:dadosGuia>",
            "<ans:identificacaoGuia>",
            "<ans:dadosBeneficiario>",
            "<ans:dadosPrestador>",
            "<ans:dadosProcedimento>",
            "<ans:diagnostico>",
            "<ans:valoresInformados>",
            "</ans:corpo>",
            "<ans:rodape>",
            "</ans:rodape>",
            "</ans:mensagemTISS>",
        ],
    );
}

#[test]
fn test_header_and_footer_registrations() {
    let xml = encode(ClaimBundleBuilder::new().with_plan_registration("ANS-777"));
    let document = XmlDocument::parse(&xml).unwrap();
    let root = document.root();
    let ns = Some(TISS_NAMESPACE);

    let header = root.child(ns, "cabecalho").unwrap();
    let operator = header.child(ns, "identificacaoOperadora").unwrap();
    assert_eq!(operator.child(ns, "codigoOperadora").unwrap().text(), "OP001");
    assert_eq!(operator.child(ns, "registroANS").unwrap().text(), "ANS-654321");
    let provider = header.child(ns, "dadosPrestador").unwrap();
    assert_eq!(provider.child(ns, "registroANS").unwrap().text(), "ANS-777");

    let footer = root.child(ns, "rodape").unwrap();
    let provider = footer.child(ns, "dadosPrestador").unwrap();
    assert_eq!(provider.child(ns, "registroANS").unwrap().text(), "ANS-777");
}

#[test]
fn test_whole_amount_gets_two_decimals() {
    let xml = encode(ClaimBundleBuilder::new().with_value(dec!(150)));
    assert_occurrences(&xml, "150.00", 4);
    assert!(!xml.contains(">150<"));
}

#[test]
fn test_amount_is_rounded_half_away_from_zero() {
    let xml = encode(ClaimBundleBuilder::new().with_value(dec!(10.005)));
    assert!(xml.contains(&leaf("valorProcedimento", "10.01")));
}

#[test]
fn test_sex_codes() {
    for (gender, code) in [
        (Gender::Male, "M"),
        (Gender::Female, "F"),
        (Gender::Indeterminate, "I"),
    ] {
        let xml = encode(ClaimBundleBuilder::new().with_gender(gender));
        assert!(xml.contains(&leaf("sexo", code)), "gender {gender:?}");
    }
}

#[test]
fn test_missing_description_uses_default() {
    let xml = encode(ClaimBundleBuilder::new().with_description(None));
    assert!(xml.contains(&leaf("descricaoProcedimento", "Procedimento médico")));
    assert!(xml.contains(&leaf("descricaoDiagnostico", "Diagnóstico médico")));
}

#[test]
fn test_markup_in_text_is_escaped() {
    let xml = encode(ClaimBundleBuilder::new().with_provider_name("Souza & Filhos <Ltda>"));
    assert!(xml.contains("Souza &amp; Filhos &lt;Ltda&gt;"));

    let document = XmlDocument::parse(&xml).unwrap();
    let name = document
        .root()
        .descendants()
        .find(|e| e.local_name() == "nomePrestador")
        .unwrap();
    assert_eq!(name.text(), "Souza & Filhos <Ltda>");
}

#[test]
fn test_output_is_indented() {
    let xml = encode(ClaimBundleBuilder::new());
    assert!(xml.contains("\n  <ans:cabecalho>"));
    assert!(xml.contains("\n    <ans:identificacaoOperadora>"));
    assert!(xml.contains("\n      <ans:codigoOperadora>OP001</ans:codigoOperadora>"));
}

#[test]
fn test_encoding_is_deterministic() {
    let bundle = ClaimBundleBuilder::new().build();
    let encoder = TissEncoder::default();
    let date = TemporalFixtures::processing_date();
    assert_eq!(
        encoder.encode(&bundle, date).unwrap(),
        encoder.encode(&bundle, date).unwrap()
    );
}

#[test]
fn test_configured_password() {
    let encoder = TissEncoder::new(EncoderOptions {
        guide_password: "A1B2".to_string(),
    });
    let xml = encoder
        .encode(&ClaimBundleBuilder::new().build(), TemporalFixtures::processing_date())
        .unwrap();
    assert!(xml.contains(&leaf("senha", "A1B2")));
}

#[test]
fn test_output_passes_structure_and_fallback_schema() {
    let xml = encode(ClaimBundleBuilder::new());
    let fallback = SchemaHandle::fallback(None, TemporalFixtures::generated_at());

    let validator = DocumentValidator::new(ValidationOptions {
        validate_with_fallback: true,
    });
    let result = validator.validate(&xml, Some(&fallback));
    assert!(result.is_valid, "{:?}", result.findings);
    let codes: Vec<_> = result.findings.iter().map(|f| f.code.as_str()).collect();
    assert_eq!(codes, ["schema-fallback"]);
}
