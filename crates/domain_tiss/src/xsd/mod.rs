//! XML Schema subset engine
//!
//! Compiles an XSD document into an in-memory model and validates parsed
//! instance documents against it. Coverage is what TISS schemas need:
//! global elements, named and anonymous complex/simple types, sequence,
//! choice and all groups with occurrence bounds, named model and attribute
//! groups, required attributes, simple content, restriction facets and the
//! common built-in datatypes.
//!
//! Constructs outside that subset (`xs:include`, `xs:import`,
//! `complexContent`, list/union types, unresolvable references) never fail
//! compilation. The affected content becomes unconstrained and the construct
//! is listed in [`XsdSchema::unsupported`].

mod compile;
pub(crate) mod datatypes;
pub(crate) mod model;
mod validate;

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::finding::ValidationFinding;
use crate::xml::{Position, XmlDocument, XmlSyntaxError};

use model::{AttributeGroup, ElementDecl, Particle, TypeDef, TypeRef};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaCompileError {
    #[error("schema document is not well-formed: {0}")]
    Malformed(#[from] XmlSyntaxError),

    #[error("document root is '{found}', expected xs:schema")]
    NotASchema { found: String },

    #[error("invalid schema at line {}, column {}: {message}", position.line, position.column)]
    Invalid { message: String, position: Position },
}

/// A compiled schema
#[derive(Debug, Clone, Default)]
pub struct XsdSchema {
    target_namespace: Option<String>,
    version: Option<String>,
    elements: HashMap<String, ElementDecl>,
    types: HashMap<String, TypeDef>,
    groups: HashMap<String, Particle>,
    attribute_groups: HashMap<String, AttributeGroup>,
    unsupported: Vec<String>,
}

impl XsdSchema {
    /// Parses and compiles XSD text
    pub fn compile(text: &str) -> Result<Self, SchemaCompileError> {
        let document = XmlDocument::parse(text)?;
        compile::compile(&document)
    }

    pub(crate) fn new(target_namespace: Option<&str>, version: Option<&str>) -> Self {
        Self {
            target_namespace: target_namespace.map(str::to_string),
            version: version.map(str::to_string),
            ..Self::default()
        }
    }

    pub(crate) fn add_element(&mut self, local: &str, type_ref: TypeRef) {
        let name = crate::xml::ExpandedName::new(self.target_namespace.as_deref(), local);
        self.elements
            .insert(local.to_string(), ElementDecl { name, type_ref });
    }

    pub(crate) fn add_type(&mut self, name: &str, definition: TypeDef) {
        self.types.insert(name.to_string(), definition);
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Value of the `version` attribute on `xs:schema`
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Local names of the global element declarations, sorted
    pub fn root_elements(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.elements.keys().collect();
        names.into_iter().cloned().collect()
    }

    /// Constructs that were skipped or left unconstrained
    pub fn unsupported(&self) -> &[String] {
        &self.unsupported
    }

    pub fn is_complete(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// Validates a parsed document; findings come back in document order
    pub fn validate(&self, document: &XmlDocument) -> Vec<ValidationFinding> {
        validate::validate_document(self, document)
    }
}
