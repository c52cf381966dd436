//! Compiled schema components

use crate::xml::ExpandedName;

use super::datatypes::{Builtin, Facets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Occurs {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Occurs {
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };
}

/// Reference from a declaration to its type
#[derive(Debug, Clone)]
pub(crate) enum TypeRef {
    Builtin(Builtin),
    /// Named type in the schema's target namespace
    Named(String),
    Inline(Box<TypeDef>),
    /// `xs:anyType` or a type the engine cannot see; never constrains
    Any,
}

#[derive(Debug, Clone)]
pub(crate) enum TypeDef {
    Simple(SimpleType),
    Complex(ComplexType),
}

/// A restriction step over `base`
#[derive(Debug, Clone)]
pub(crate) struct SimpleType {
    pub base: TypeRef,
    pub facets: Facets,
}

#[derive(Debug, Clone)]
pub(crate) struct ComplexType {
    pub content: Content,
    pub attributes: Vec<AttributeDecl>,
    pub attribute_groups: Vec<String>,
    pub any_attribute: bool,
}

impl ComplexType {
    pub fn element_only(particle: Particle) -> Self {
        Self {
            content: Content::Elements {
                particle,
                mixed: false,
            },
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
            any_attribute: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Content {
    Empty,
    Elements { particle: Particle, mixed: bool },
    Simple(TypeRef),
    Any,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementDecl {
    pub name: ExpandedName,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub occurs: Occurs,
    pub term: Term,
}

#[derive(Debug, Clone)]
pub(crate) enum Term {
    Element(ElementDecl),
    /// Reference to a global element, by local name
    ElementRef(String),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    All(Vec<Particle>),
    GroupRef(String),
    Wildcard,
}

impl Particle {
    pub fn once(term: Term) -> Self {
        Self {
            occurs: Occurs::ONCE,
            term,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeDecl {
    pub name: String,
    pub type_ref: TypeRef,
    pub required: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeGroup {
    pub attributes: Vec<AttributeDecl>,
    pub groups: Vec<String>,
    pub any_attribute: bool,
}
