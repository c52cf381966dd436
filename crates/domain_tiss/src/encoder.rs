//! TISS Document Encoder
//!
//! Turns a [`ClaimBundle`] into a TISS 3.05.00 guide document. Encoding is a
//! pure function of the bundle, the options and the processing date passed
//! in: the same inputs always give byte-identical output.
//!
//! ```text
//! mensagemTISS (version)
//! ├── cabecalho   operator, provider, processing date, protocol
//! ├── corpo
//! │   └── dadosGuia
//! │       ├── identificacaoGuia   guide numbers, authorization, password
//! │       ├── dadosBeneficiario   card, name, birth date, sex, CPF
//! │       ├── dadosPrestador      CNPJ, name, type
//! │       ├── dadosProcedimento   code, description, date, value
//! │       ├── diagnostico         code, description
//! │       └── valoresInformados   totals
//! └── rodape      provider, processing date, total
//! ```

use chrono::{DateTime, Days, NaiveDate, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use core_kernel::{format_iso_date, ClaimId};
use domain_claims::{ClaimBundle, Gender};

use crate::constants::{
    DEFAULT_DIAGNOSIS_DESCRIPTION, DEFAULT_GUIDE_PASSWORD, DEFAULT_PROCEDURE_DESCRIPTION,
    PASSWORD_VALIDITY_DAYS, ROOT_ELEMENT, TISS_NAMESPACE, TISS_PREFIX, TISS_VERSION,
};
use crate::error::TissError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderOptions {
    /// Value written to `senha`; a placeholder until guide passwords come
    /// from the operator's authorization system
    pub guide_password: String,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            guide_password: DEFAULT_GUIDE_PASSWORD.to_string(),
        }
    }
}

/// TISS sex code
pub fn sex_code(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "M",
        Gender::Female => "F",
        Gender::Indeterminate => "I",
    }
}

/// Download file name for a generated document
pub fn suggested_filename(claim_id: ClaimId, generated_at: DateTime<Utc>) -> String {
    format!(
        "tiss_claim_{}_{}.xml",
        claim_id.value(),
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// Indented writer emitting `ans:`-prefixed elements
struct DocumentWriter {
    writer: Writer<Vec<u8>>,
}

impl DocumentWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), TissError> {
        self.writer
            .write_event(event)
            .map_err(|e| TissError::encoding(e.to_string()))
    }

    fn qualified(local: &str) -> String {
        format!("{TISS_PREFIX}:{local}")
    }

    fn declaration(&mut self) -> Result<(), TissError> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn open(&mut self, local: &str) -> Result<(), TissError> {
        self.write(Event::Start(BytesStart::new(Self::qualified(local))))
    }

    fn open_with(&mut self, start: BytesStart<'_>) -> Result<(), TissError> {
        self.write(Event::Start(start))
    }

    fn close(&mut self, local: &str) -> Result<(), TissError> {
        self.write(Event::End(BytesEnd::new(Self::qualified(local))))
    }

    fn leaf(&mut self, local: &str, text: &str) -> Result<(), TissError> {
        self.open(local)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.close(local)
    }

    fn finish(self) -> Result<String, TissError> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| TissError::encoding(format!("generated document is not UTF-8: {e}")))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TissEncoder {
    options: EncoderOptions,
}

impl TissEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Encodes one guide document dated `processing_date`
    pub fn encode(&self, bundle: &ClaimBundle, processing_date: NaiveDate) -> Result<String, TissError> {
        let claim = bundle.claim();
        let patient = bundle.patient();
        let provider = bundle.provider();
        let plan = bundle.plan();
        let operator = bundle.operator();

        let claim_number = claim.id.value().to_string();
        let processing_date = format_iso_date(processing_date);
        let authorization_date = format_iso_date(claim.service_date);
        let password_expiry = claim
            .service_date
            .checked_add_days(Days::new(PASSWORD_VALIDITY_DAYS))
            .map(format_iso_date)
            .ok_or_else(|| TissError::encoding("password expiry date is out of range"))?;
        let value = claim.value.to_fixed();
        let cnpj = provider.cnpj.to_string();

        let mut doc = DocumentWriter::new();
        doc.declaration()?;
        let xmlns = format!("xmlns:{TISS_PREFIX}");
        let root = BytesStart::new(DocumentWriter::qualified(ROOT_ELEMENT))
            .with_attributes([(xmlns.as_str(), TISS_NAMESPACE), ("version", TISS_VERSION)]);
        doc.open_with(root)?;

        doc.open("cabecalho")?;
        doc.open("identificacaoOperadora")?;
        doc.leaf("codigoOperadora", &operator.operator_code)?;
        doc.leaf("registroANS", &operator.ans_registration)?;
        doc.close("identificacaoOperadora")?;
        doc.open("dadosPrestador")?;
        doc.leaf("cnpjPrestador", &cnpj)?;
        doc.leaf("registroANS", &plan.registration_number)?;
        doc.close("dadosPrestador")?;
        doc.leaf("dataProcessamento", &processing_date)?;
        doc.leaf("numeroProtocolo", &claim_number)?;
        doc.close("cabecalho")?;

        doc.open("corpo")?;
        doc.open("dadosGuia")?;

        doc.open("identificacaoGuia")?;
        doc.leaf("numeroGuiaPrestador", &claim_number)?;
        doc.leaf("numeroGuiaOperadora", &claim_number)?;
        doc.leaf("dataAutorizacao", &authorization_date)?;
        doc.leaf("senha", &self.options.guide_password)?;
        doc.leaf("dataValidadeSenha", &password_expiry)?;
        doc.close("identificacaoGuia")?;

        doc.open("dadosBeneficiario")?;
        doc.leaf("numeroCarteira", &patient.id.to_string())?;
        doc.leaf("nomeBeneficiario", &patient.name)?;
        doc.leaf("dataNascimento", &format_iso_date(patient.birth_date))?;
        doc.leaf("sexo", sex_code(patient.gender))?;
        doc.leaf("cpf", &patient.cpf.to_string())?;
        doc.close("dadosBeneficiario")?;

        doc.open("dadosPrestador")?;
        doc.leaf("cnpjPrestador", &cnpj)?;
        doc.leaf("nomePrestador", &provider.name)?;
        doc.leaf("tipoPrestador", provider.provider_type.as_str())?;
        doc.close("dadosPrestador")?;

        doc.open("dadosProcedimento")?;
        doc.leaf("codigoProcedimento", &claim.procedure_code)?;
        let description = claim
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(DEFAULT_PROCEDURE_DESCRIPTION);
        doc.leaf("descricaoProcedimento", description)?;
        doc.leaf("dataProcedimento", &authorization_date)?;
        doc.leaf("valorProcedimento", &value)?;
        doc.close("dadosProcedimento")?;

        doc.open("diagnostico")?;
        doc.leaf("codigoDiagnostico", &claim.diagnosis_code)?;
        doc.leaf("descricaoDiagnostico", DEFAULT_DIAGNOSIS_DESCRIPTION)?;
        doc.close("diagnostico")?;

        doc.open("valoresInformados")?;
        doc.leaf("valorTotalGeral", &value)?;
        doc.leaf("valorTotalProcedimentos", &value)?;
        doc.close("valoresInformados")?;

        doc.close("dadosGuia")?;
        doc.close("corpo")?;

        doc.open("rodape")?;
        doc.open("dadosPrestador")?;
        doc.leaf("cnpjPrestador", &cnpj)?;
        doc.leaf("registroANS", &plan.registration_number)?;
        doc.close("dadosPrestador")?;
        doc.leaf("dataProcessamento", &processing_date)?;
        doc.leaf("valorTotalGeral", &value)?;
        doc.close("rodape")?;

        doc.close(ROOT_ELEMENT)?;
        doc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sex_codes() {
        assert_eq!(sex_code(Gender::Male), "M");
        assert_eq!(sex_code(Gender::Female), "F");
        assert_eq!(sex_code(Gender::Indeterminate), "I");
    }

    #[test]
    fn test_suggested_filename() {
        let at = Utc.with_ymd_and_hms(2024, 1, 16, 9, 5, 7).unwrap();
        assert_eq!(
            suggested_filename(ClaimId::new(42), at),
            "tiss_claim_42_20240116_090507.xml"
        );
    }

    #[test]
    fn test_default_password() {
        assert_eq!(EncoderOptions::default().guide_password, "123456");
    }
}
