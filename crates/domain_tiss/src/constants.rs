//! TISS wire constants

/// TISS standard version carried in the root `version` attribute
pub const TISS_VERSION: &str = "3.05.00";

/// Namespace URI of every TISS element
pub const TISS_NAMESPACE: &str = "http://www.ans.gov.br/padroes/tiss/schemas";

/// Prefix bound to [`TISS_NAMESPACE`] in generated documents
pub const TISS_PREFIX: &str = "ans";

/// Local name of the document root
pub const ROOT_ELEMENT: &str = "mensagemTISS";

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace (`xsi:` attributes are always allowed)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace permanently bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Days an issued guide password stays valid after the authorization date
pub const PASSWORD_VALIDITY_DAYS: u64 = 30;

/// Placeholder guide password used when none is configured
pub const DEFAULT_GUIDE_PASSWORD: &str = "123456";

/// Procedure description used when the claim carries none
pub const DEFAULT_PROCEDURE_DESCRIPTION: &str = "Procedimento médico";

/// Diagnosis description (no diagnosis catalogue is consulted)
pub const DEFAULT_DIAGNOSIS_DESCRIPTION: &str = "Diagnóstico médico";
