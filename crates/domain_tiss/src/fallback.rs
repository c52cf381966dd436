//! Synthesized fallback schema
//!
//! Used when the official TISS schema cannot be obtained. It pins down the
//! mandatory shape of a guide document: the namespaced root with its required
//! `version` attribute, header/body/footer, and within the body the guide
//! identification, beneficiary and provider sections, in the element order the
//! encoder produces.
//!
//! The compiled model and the XSD text written to disk come from the same
//! table, so both are deterministic and always agree.

use crate::constants::{ROOT_ELEMENT, TISS_NAMESPACE, TISS_PREFIX, XSD_NAMESPACE};
use crate::xml::ExpandedName;
use crate::xsd::datatypes::{Builtin, Facets, Pattern};
use crate::xsd::model::{
    AttributeDecl, ComplexType, ElementDecl, Particle, SimpleType, Term, TypeDef, TypeRef,
};
use crate::xsd::XsdSchema;

/// Provenance tag of the fallback; distinct from any official version string
pub const FALLBACK_VERSION: &str = "3.05.00-fallback.1";

#[derive(Clone, Copy)]
enum FieldType {
    /// `xs:` built-in, by local name
    Builtin(&'static str),
    /// Type defined in this schema
    Named(&'static str),
}

struct ComplexTypeEntry {
    name: &'static str,
    fields: &'static [(&'static str, FieldType)],
}

struct SimpleTypeEntry {
    name: &'static str,
    base: &'static str,
    enumeration: &'static [&'static str],
    pattern: Option<&'static str>,
}

use FieldType::{Builtin as B, Named as N};

const ROOT_FIELDS: &[(&str, FieldType)] = &[
    ("cabecalho", N("CabecalhoType")),
    ("corpo", N("CorpoType")),
    ("rodape", N("RodapeType")),
];

const COMPLEX_TYPES: &[ComplexTypeEntry] = &[
    ComplexTypeEntry {
        name: "CabecalhoType",
        fields: &[
            ("identificacaoOperadora", N("IdentificacaoOperadoraType")),
            ("dadosPrestador", N("PrestadorIdentificacaoType")),
            ("dataProcessamento", B("date")),
            ("numeroProtocolo", B("string")),
        ],
    },
    ComplexTypeEntry {
        name: "IdentificacaoOperadoraType",
        fields: &[("codigoOperadora", B("string")), ("registroANS", B("string"))],
    },
    ComplexTypeEntry {
        name: "PrestadorIdentificacaoType",
        fields: &[("cnpjPrestador", N("CnpjType")), ("registroANS", B("string"))],
    },
    ComplexTypeEntry {
        name: "CorpoType",
        fields: &[("dadosGuia", N("DadosGuiaType"))],
    },
    ComplexTypeEntry {
        name: "DadosGuiaType",
        fields: &[
            ("identificacaoGuia", N("IdentificacaoGuiaType")),
            ("dadosBeneficiario", N("DadosBeneficiarioType")),
            ("dadosPrestador", N("DadosPrestadorGuiaType")),
            ("dadosProcedimento", N("DadosProcedimentoType")),
            ("diagnostico", N("DiagnosticoType")),
            ("valoresInformados", N("ValoresInformadosType")),
        ],
    },
    ComplexTypeEntry {
        name: "IdentificacaoGuiaType",
        fields: &[
            ("numeroGuiaPrestador", B("string")),
            ("numeroGuiaOperadora", B("string")),
            ("dataAutorizacao", B("date")),
            ("senha", B("string")),
            ("dataValidadeSenha", B("date")),
        ],
    },
    ComplexTypeEntry {
        name: "DadosBeneficiarioType",
        fields: &[
            ("numeroCarteira", B("string")),
            ("nomeBeneficiario", B("string")),
            ("dataNascimento", B("date")),
            ("sexo", N("SexoType")),
            ("cpf", N("CpfType")),
        ],
    },
    ComplexTypeEntry {
        name: "DadosPrestadorGuiaType",
        fields: &[
            ("cnpjPrestador", N("CnpjType")),
            ("nomePrestador", B("string")),
            ("tipoPrestador", B("string")),
        ],
    },
    ComplexTypeEntry {
        name: "DadosProcedimentoType",
        fields: &[
            ("codigoProcedimento", B("string")),
            ("descricaoProcedimento", B("string")),
            ("dataProcedimento", B("date")),
            ("valorProcedimento", N("ValorMonetarioType")),
        ],
    },
    ComplexTypeEntry {
        name: "DiagnosticoType",
        fields: &[
            ("codigoDiagnostico", B("string")),
            ("descricaoDiagnostico", B("string")),
        ],
    },
    ComplexTypeEntry {
        name: "ValoresInformadosType",
        fields: &[
            ("valorTotalGeral", N("ValorMonetarioType")),
            ("valorTotalProcedimentos", N("ValorMonetarioType")),
        ],
    },
    ComplexTypeEntry {
        name: "RodapeType",
        fields: &[
            ("dadosPrestador", N("PrestadorIdentificacaoType")),
            ("dataProcessamento", B("date")),
            ("valorTotalGeral", N("ValorMonetarioType")),
        ],
    },
];

const SIMPLE_TYPES: &[SimpleTypeEntry] = &[
    SimpleTypeEntry {
        name: "SexoType",
        base: "string",
        enumeration: &["M", "F", "I"],
        pattern: None,
    },
    SimpleTypeEntry {
        name: "CpfType",
        base: "string",
        enumeration: &[],
        pattern: Some(r"\d{3}\.\d{3}\.\d{3}-\d{2}"),
    },
    SimpleTypeEntry {
        name: "CnpjType",
        base: "string",
        enumeration: &[],
        pattern: Some(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}"),
    },
    SimpleTypeEntry {
        name: "ValorMonetarioType",
        base: "decimal",
        enumeration: &[],
        pattern: Some(r"\d+\.\d{2}"),
    },
];

fn type_ref(field_type: FieldType) -> TypeRef {
    match field_type {
        FieldType::Builtin(local) => Builtin::from_local(local).map_or(TypeRef::Any, TypeRef::Builtin),
        FieldType::Named(name) => TypeRef::Named(name.to_string()),
    }
}

fn sequence(fields: &[(&str, FieldType)]) -> ComplexType {
    let items = fields
        .iter()
        .map(|(name, field_type)| {
            Particle::once(Term::Element(ElementDecl {
                name: ExpandedName::new(Some(TISS_NAMESPACE), *name),
                type_ref: type_ref(*field_type),
            }))
        })
        .collect();
    ComplexType::element_only(Particle::once(Term::Sequence(items)))
}

/// Builds the compiled fallback schema
pub fn fallback_schema() -> XsdSchema {
    let mut schema = XsdSchema::new(Some(TISS_NAMESPACE), Some(FALLBACK_VERSION));

    let mut root = sequence(ROOT_FIELDS);
    root.attributes.push(AttributeDecl {
        name: "version".to_string(),
        type_ref: TypeRef::Builtin(Builtin::String),
        required: true,
    });
    schema.add_element(ROOT_ELEMENT, TypeRef::Inline(Box::new(TypeDef::Complex(root))));

    for spec in COMPLEX_TYPES {
        schema.add_type(spec.name, TypeDef::Complex(sequence(spec.fields)));
    }
    for spec in SIMPLE_TYPES {
        let facets = Facets {
            enumeration: spec.enumeration.iter().map(|v| v.to_string()).collect(),
            pattern: spec
                .pattern
                .and_then(|p| Pattern::compile(&[p.to_string()]).ok()),
            ..Facets::default()
        };
        let base = type_ref(FieldType::Builtin(spec.base));
        schema.add_type(spec.name, TypeDef::Simple(SimpleType { base, facets }));
    }
    schema
}

fn push_fields(out: &mut String, fields: &[(&str, FieldType)], indent: &str) {
    out.push_str(&format!("{indent}<xs:sequence>\n"));
    for (name, field_type) in fields {
        let type_name = match field_type {
            FieldType::Builtin(local) => format!("xs:{local}"),
            FieldType::Named(named) => format!("{TISS_PREFIX}:{named}"),
        };
        out.push_str(&format!(
            "{indent}  <xs:element name=\"{name}\" type=\"{type_name}\"/>\n"
        ));
    }
    out.push_str(&format!("{indent}</xs:sequence>\n"));
}

/// Renders the fallback as XSD text, byte-identical on every call
pub fn render_fallback_xsd() -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<xs:schema xmlns:xs=\"{XSD_NAMESPACE}\" xmlns:{TISS_PREFIX}=\"{TISS_NAMESPACE}\" \
         targetNamespace=\"{TISS_NAMESPACE}\" elementFormDefault=\"qualified\" version=\"{FALLBACK_VERSION}\">\n"
    ));

    out.push_str(&format!("  <xs:element name=\"{ROOT_ELEMENT}\">\n"));
    out.push_str("    <xs:complexType>\n");
    push_fields(&mut out, ROOT_FIELDS, "      ");
    out.push_str("      <xs:attribute name=\"version\" type=\"xs:string\" use=\"required\"/>\n");
    out.push_str("    </xs:complexType>\n");
    out.push_str("  </xs:element>\n");

    for spec in COMPLEX_TYPES {
        out.push_str(&format!("  <xs:complexType name=\"{}\">\n", spec.name));
        push_fields(&mut out, spec.fields, "    ");
        out.push_str("  </xs:complexType>\n");
    }

    for spec in SIMPLE_TYPES {
        out.push_str(&format!("  <xs:simpleType name=\"{}\">\n", spec.name));
        out.push_str(&format!("    <xs:restriction base=\"xs:{}\">\n", spec.base));
        for value in spec.enumeration {
            out.push_str(&format!("      <xs:enumeration value=\"{value}\"/>\n"));
        }
        if let Some(pattern) = spec.pattern {
            out.push_str(&format!("      <xs:pattern value=\"{pattern}\"/>\n"));
        }
        out.push_str("    </xs:restriction>\n");
        out.push_str("  </xs:simpleType>\n");
    }

    out.push_str("</xs:schema>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const VALID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ans:mensagemTISS xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas" version="3.05.00">
  <ans:cabecalho>
    <ans:identificacaoOperadora>
      <ans:codigoOperadora>OP001</ans:codigoOperadora>
      <ans:registroANS>123456</ans:registroANS>
    </ans:identificacaoOperadora>
    <ans:dadosPrestador>
      <ans:cnpjPrestador>12.345.678/0001-95</ans:cnpjPrestador>
      <ans:registroANS>654321</ans:registroANS>
    </ans:dadosPrestador>
    <ans:dataProcessamento>2024-01-20</ans:dataProcessamento>
    <ans:numeroProtocolo>1</ans:numeroProtocolo>
  </ans:cabecalho>
  <ans:corpo>
    <ans:dadosGuia>
      <ans:identificacaoGuia>
        <ans:numeroGuiaPrestador>1</ans:numeroGuiaPrestador>
        <ans:numeroGuiaOperadora>1</ans:numeroGuiaOperadora>
        <ans:dataAutorizacao>2024-01-15</ans:dataAutorizacao>
        <ans:senha>123456</ans:senha>
        <ans:dataValidadeSenha>2024-02-14</ans:dataValidadeSenha>
      </ans:identificacaoGuia>
      <ans:dadosBeneficiario>
        <ans:numeroCarteira>1</ans:numeroCarteira>
        <ans:nomeBeneficiario>Maria Silva</ans:nomeBeneficiario>
        <ans:dataNascimento>1985-03-10</ans:dataNascimento>
        <ans:sexo>F</ans:sexo>
        <ans:cpf>987.654.321-00</ans:cpf>
      </ans:dadosBeneficiario>
      <ans:dadosPrestador>
        <ans:cnpjPrestador>12.345.678/0001-95</ans:cnpjPrestador>
        <ans:nomePrestador>Hospital Central</ans:nomePrestador>
        <ans:tipoPrestador>hospital</ans:tipoPrestador>
      </ans:dadosPrestador>
      <ans:dadosProcedimento>
        <ans:codigoProcedimento>PROC-001</ans:codigoProcedimento>
        <ans:descricaoProcedimento>Consulta</ans:descricaoProcedimento>
        <ans:dataProcedimento>2024-01-15</ans:dataProcedimento>
        <ans:valorProcedimento>150.00</ans:valorProcedimento>
      </ans:dadosProcedimento>
      <ans:diagnostico>
        <ans:codigoDiagnostico>J00</ans:codigoDiagnostico>
        <ans:descricaoDiagnostico>Diagnóstico médico</ans:descricaoDiagnostico>
      </ans:diagnostico>
      <ans:valoresInformados>
        <ans:valorTotalGeral>150.00</ans:valorTotalGeral>
        <ans:valorTotalProcedimentos>150.00</ans:valorTotalProcedimentos>
      </ans:valoresInformados>
    </ans:dadosGuia>
  </ans:corpo>
  <ans:rodape>
    <ans:dadosPrestador>
      <ans:cnpjPrestador>12.345.678/0001-95</ans:cnpjPrestador>
      <ans:registroANS>654321</ans:registroANS>
    </ans:dadosPrestador>
    <ans:dataProcessamento>2024-01-20</ans:dataProcessamento>
    <ans:valorTotalGeral>150.00</ans:valorTotalGeral>
  </ans:rodape>
</ans:mensagemTISS>"#;

    fn codes(schema: &XsdSchema, text: &str) -> Vec<String> {
        let document = XmlDocument::parse(text).unwrap();
        schema.validate(&document).into_iter().map(|f| f.code).collect()
    }

    #[test]
    fn test_fallback_is_complete() {
        let schema = fallback_schema();
        assert!(schema.is_complete(), "{:?}", schema.unsupported());
        assert_eq!(schema.root_elements(), [ROOT_ELEMENT]);
        assert_eq!(schema.version(), Some(FALLBACK_VERSION));
        assert_eq!(schema.target_namespace(), Some(TISS_NAMESPACE));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(render_fallback_xsd(), render_fallback_xsd());
    }

    #[test]
    fn test_rendered_text_compiles_to_the_same_schema() {
        let compiled = XsdSchema::compile(&render_fallback_xsd()).unwrap();
        let built = fallback_schema();
        assert!(compiled.is_complete(), "{:?}", compiled.unsupported());
        assert_eq!(compiled.root_elements(), built.root_elements());
        assert_eq!(compiled.version(), built.version());

        let broken = VALID
            .replace("<ans:sexo>F</ans:sexo>", "<ans:sexo>X</ans:sexo>")
            .replace(
                "<ans:valorTotalGeral>150.00</ans:valorTotalGeral>\n        <ans:valorTotalProcedimentos>",
                "<ans:valorTotalProcedimentos>",
            )
            .replace(" version=\"3.05.00\"", "");
        for text in [VALID, broken.as_str()] {
            assert_eq!(codes(&compiled, text), codes(&built, text));
        }
    }

    #[test]
    fn test_accepts_well_formed_guide() {
        assert!(codes(&fallback_schema(), VALID).is_empty());
    }

    #[test]
    fn test_rejects_bad_values() {
        let text = VALID
            .replace("<ans:sexo>F</ans:sexo>", "<ans:sexo>X</ans:sexo>")
            .replace("987.654.321-00", "98765432100")
            .replace("<ans:valorProcedimento>150.00", "<ans:valorProcedimento>150");
        assert_eq!(
            codes(&fallback_schema(), &text),
            ["cvc-enumeration-valid", "cvc-pattern-valid", "cvc-pattern-valid"]
        );
    }

    #[test]
    fn test_requires_version_attribute() {
        let text = VALID.replace(" version=\"3.05.00\"", "");
        assert_eq!(codes(&fallback_schema(), &text), ["cvc-complex-type.4"]);
    }

    #[test]
    fn test_missing_section_is_a_content_error() {
        let start = VALID.find("<ans:corpo>").unwrap();
        let end = VALID.find("</ans:corpo>").unwrap() + "</ans:corpo>".len();
        let text = format!("{}{}", &VALID[..start], &VALID[end..]);
        assert_eq!(codes(&fallback_schema(), &text), ["cvc-complex-type.2.4.a"]);
    }
}
