//! TISS 3.05.00 Document Codec
//!
//! Generates TISS guide documents from assembled claim bundles and validates
//! arbitrary XML against the official (or a synthesized fallback) schema.
//!
//! # Generation
//!
//! ```text
//! ClaimId -> ClaimBundleAssembler -> TissEncoder -> SchemaProvider -> DocumentValidator
//!                                        |                                  |
//!                                     xml text                      ValidationResult
//! ```
//!
//! # Validation stages
//!
//! 1. Well-formedness (`malformed-xml`)
//! 2. Structure: root, namespace, version, mandatory sections
//! 3. Schema conformance (XSD subset engine), official schema or opt-in fallback

pub mod constants;
pub mod xml;
pub mod xsd;
pub mod fallback;
pub mod schema;
pub mod finding;
pub mod structure;
pub mod validator;
pub mod encoder;
pub mod codec;
pub mod error;

pub use constants::{TISS_NAMESPACE, TISS_VERSION};
pub use xml::{Position, XmlDocument, XmlElement, XmlSyntaxError};
pub use xsd::{SchemaCompileError, XsdSchema};
pub use fallback::{fallback_schema, render_fallback_xsd, FALLBACK_VERSION};
pub use schema::{schema_digest, SchemaHandle, SchemaProvider, SchemaSource, StaticSchemaProvider};
pub use finding::{FindingKind, Section, Severity, ValidationFinding, ValidationResult};
pub use validator::{DocumentValidator, ValidationOptions};
pub use encoder::{sex_code, suggested_filename, EncoderOptions, TissEncoder};
pub use codec::{GeneratedDocument, TissCodec};
pub use error::TissError;
