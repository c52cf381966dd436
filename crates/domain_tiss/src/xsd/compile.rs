//! XSD document to schema model

use crate::constants::XSD_NAMESPACE;
use crate::xml::{ExpandedName, XmlDocument, XmlElement};

use super::datatypes::{Builtin, Facets, Pattern};
use super::model::{
    AttributeDecl, AttributeGroup, ComplexType, Content, ElementDecl, MaxOccurs, Occurs,
    Particle, SimpleType, Term, TypeDef, TypeRef,
};
use super::{SchemaCompileError, XsdSchema};

fn is_xs(element: &XmlElement, local: &str) -> bool {
    element.name().is(Some(XSD_NAMESPACE), local)
}

fn is_annotation(element: &XmlElement) -> bool {
    is_xs(element, "annotation")
}

fn invalid(element: &XmlElement, message: impl Into<String>) -> SchemaCompileError {
    SchemaCompileError::Invalid {
        message: message.into(),
        position: element.position(),
    }
}

fn required_attr<'e>(element: &'e XmlElement, name: &str) -> Result<&'e str, SchemaCompileError> {
    element.attribute(name).ok_or_else(|| {
        invalid(
            element,
            format!("xs:{} requires a '{}' attribute", element.local_name(), name),
        )
    })
}

struct Compiler {
    schema: XsdSchema,
    qualified_elements: bool,
}

pub(super) fn compile(document: &XmlDocument) -> Result<XsdSchema, SchemaCompileError> {
    let root = document.root();
    if !is_xs(root, "schema") {
        return Err(SchemaCompileError::NotASchema {
            found: root.name().to_string(),
        });
    }

    let mut compiler = Compiler {
        schema: XsdSchema::new(root.attribute("targetNamespace"), root.attribute("version")),
        qualified_elements: root.attribute("elementFormDefault") == Some("qualified"),
    };
    for child in root.children() {
        compiler.top_level(child)?;
    }
    compiler.check_references();
    Ok(compiler.schema)
}

impl Compiler {
    fn note(&mut self, message: String) {
        if !self.schema.unsupported.contains(&message) {
            self.schema.unsupported.push(message);
        }
    }

    fn target_ns(&self) -> Option<&str> {
        self.schema.target_namespace.as_deref()
    }

    fn top_level(&mut self, element: &XmlElement) -> Result<(), SchemaCompileError> {
        if element.namespace() != Some(XSD_NAMESPACE) {
            return Ok(());
        }
        match element.local_name() {
            "element" => {
                let name = required_attr(element, "name")?;
                let type_ref = self.element_type(element)?;
                self.schema.add_element(name, type_ref);
            }
            "complexType" => {
                let name = required_attr(element, "name")?;
                let definition = self.complex_type(element)?;
                self.schema.add_type(name, TypeDef::Complex(definition));
            }
            "simpleType" => {
                let name = required_attr(element, "name")?;
                let definition = self.simple_type(element)?;
                self.schema.add_type(name, TypeDef::Simple(definition));
            }
            "group" => {
                let name = required_attr(element, "name")?;
                let model = element
                    .children()
                    .iter()
                    .find(|c| is_xs(c, "sequence") || is_xs(c, "choice") || is_xs(c, "all"));
                if let Some(model) = model {
                    let mut particle = self.particle(model)?;
                    particle.occurs = Occurs::ONCE;
                    self.schema.groups.insert(name.to_string(), particle);
                }
            }
            "attributeGroup" => {
                let name = required_attr(element, "name")?;
                let mut group = AttributeGroup::default();
                for child in element.children() {
                    match child.local_name() {
                        "attribute" => group.attributes.extend(self.attribute(child)?),
                        "attributeGroup" => group.groups.extend(self.group_ref(child)),
                        "anyAttribute" => group.any_attribute = true,
                        _ => {}
                    }
                }
                self.schema.attribute_groups.insert(name.to_string(), group);
            }
            "include" | "import" | "redefine" | "override" => {
                let target = element
                    .attribute("schemaLocation")
                    .or_else(|| element.attribute("namespace"))
                    .unwrap_or("?");
                self.note(format!("xs:{} of '{}' is not followed", element.local_name(), target));
            }
            "annotation" | "notation" | "attribute" => {}
            other => self.note(format!("top-level xs:{other} is not supported")),
        }
        Ok(())
    }

    fn type_ref(&mut self, element: &XmlElement, qname: &str) -> Result<TypeRef, SchemaCompileError> {
        let name = element
            .resolve_qname(qname)
            .ok_or_else(|| invalid(element, format!("type '{qname}' uses an unbound prefix")))?;
        if name.namespace.as_deref() == Some(XSD_NAMESPACE) {
            if name.local == "anyType" {
                return Ok(TypeRef::Any);
            }
            return Ok(match Builtin::from_local(&name.local) {
                Some(builtin) => TypeRef::Builtin(builtin),
                None => {
                    self.note(format!("built-in type xs:{} is not supported", name.local));
                    TypeRef::Any
                }
            });
        }
        if name.namespace.as_deref() == self.target_ns() {
            return Ok(TypeRef::Named(name.local));
        }
        self.note(format!("type {name} belongs to a schema that was not loaded"));
        Ok(TypeRef::Any)
    }

    fn element_type(&mut self, element: &XmlElement) -> Result<TypeRef, SchemaCompileError> {
        if let Some(qname) = element.attribute("type") {
            return self.type_ref(element, qname);
        }
        for child in element.children() {
            if is_xs(child, "complexType") {
                return Ok(TypeRef::Inline(Box::new(TypeDef::Complex(self.complex_type(child)?))));
            }
            if is_xs(child, "simpleType") {
                return Ok(TypeRef::Inline(Box::new(TypeDef::Simple(self.simple_type(child)?))));
            }
        }
        Ok(TypeRef::Any)
    }

    fn complex_type(&mut self, element: &XmlElement) -> Result<ComplexType, SchemaCompileError> {
        let mixed = matches!(element.attribute("mixed"), Some("true" | "1"));
        let mut definition = ComplexType {
            content: Content::Empty,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
            any_attribute: false,
        };

        for child in element.children() {
            if child.namespace() != Some(XSD_NAMESPACE) {
                continue;
            }
            match child.local_name() {
                "sequence" | "choice" | "all" | "group" => {
                    definition.content = Content::Elements {
                        particle: self.particle(child)?,
                        mixed,
                    };
                }
                "attribute" => definition.attributes.extend(self.attribute(child)?),
                "attributeGroup" => definition.attribute_groups.extend(self.group_ref(child)),
                "anyAttribute" => definition.any_attribute = true,
                "simpleContent" => self.simple_content(child, &mut definition)?,
                "complexContent" => {
                    self.note("xs:complexContent derivation is not supported".to_string());
                    definition.content = Content::Any;
                    definition.any_attribute = true;
                }
                "annotation" => {}
                other => self.note(format!("xs:{other} inside xs:complexType is not supported")),
            }
        }

        if mixed && matches!(definition.content, Content::Empty) {
            definition.content = Content::Elements {
                particle: Particle::once(Term::Sequence(Vec::new())),
                mixed: true,
            };
        }
        Ok(definition)
    }

    fn simple_content(
        &mut self,
        element: &XmlElement,
        definition: &mut ComplexType,
    ) -> Result<(), SchemaCompileError> {
        let derivation = element
            .children()
            .iter()
            .find(|c| is_xs(c, "extension") || is_xs(c, "restriction"))
            .ok_or_else(|| invalid(element, "xs:simpleContent needs an extension or restriction"))?;
        let base = self.type_ref(derivation, required_attr(derivation, "base")?)?;
        let facets = self.facets(derivation)?;

        for child in derivation.children() {
            match child.local_name() {
                "attribute" => definition.attributes.extend(self.attribute(child)?),
                "attributeGroup" => definition.attribute_groups.extend(self.group_ref(child)),
                "anyAttribute" => definition.any_attribute = true,
                _ => {}
            }
        }

        definition.content = if facets.is_empty() {
            Content::Simple(base)
        } else {
            Content::Simple(TypeRef::Inline(Box::new(TypeDef::Simple(SimpleType { base, facets }))))
        };
        Ok(())
    }

    fn simple_type(&mut self, element: &XmlElement) -> Result<SimpleType, SchemaCompileError> {
        let restriction = element.children().iter().find(|c| is_xs(c, "restriction"));
        let Some(restriction) = restriction else {
            self.note("xs:list and xs:union types are not checked".to_string());
            return Ok(SimpleType {
                base: TypeRef::Builtin(Builtin::AnySimple),
                facets: Facets::default(),
            });
        };

        let base = match restriction.attribute("base") {
            Some(qname) => self.type_ref(restriction, qname)?,
            None => match restriction.children().iter().find(|c| is_xs(c, "simpleType")) {
                Some(inline) => TypeRef::Inline(Box::new(TypeDef::Simple(self.simple_type(inline)?))),
                None => return Err(invalid(restriction, "xs:restriction needs a base type")),
            },
        };
        let facets = self.facets(restriction)?;
        Ok(SimpleType { base, facets })
    }

    fn facets(&mut self, restriction: &XmlElement) -> Result<Facets, SchemaCompileError> {
        let mut facets = Facets::default();
        let mut patterns = Vec::new();

        for child in restriction.children() {
            if child.namespace() != Some(XSD_NAMESPACE) {
                continue;
            }
            let local = child.local_name();
            match local {
                "enumeration" => facets.enumeration.push(required_attr(child, "value")?.to_string()),
                "pattern" => patterns.push(required_attr(child, "value")?.to_string()),
                "length" | "minLength" | "maxLength" => {
                    let raw = required_attr(child, "value")?;
                    let value = raw
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| invalid(child, format!("xs:{local} value '{raw}' is not a length")))?;
                    match local {
                        "length" => facets.length = Some(value),
                        "minLength" => facets.min_length = Some(value),
                        _ => facets.max_length = Some(value),
                    }
                }
                "totalDigits" | "fractionDigits" => {
                    let raw = required_attr(child, "value")?;
                    let value = raw
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| invalid(child, format!("xs:{local} value '{raw}' is not a digit count")))?;
                    if local == "totalDigits" {
                        facets.total_digits = Some(value);
                    } else {
                        facets.fraction_digits = Some(value);
                    }
                }
                "whiteSpace" | "annotation" | "simpleType" | "attribute" | "attributeGroup"
                | "anyAttribute" => {}
                other => self.note(format!("facet xs:{other} is not checked")),
            }
        }

        if !patterns.is_empty() {
            match Pattern::compile(&patterns) {
                Ok(pattern) => facets.pattern = Some(pattern),
                Err(_) => self.note(format!("pattern '{}' is not checked", patterns.join(" | "))),
            }
        }
        Ok(facets)
    }

    fn occurs(&self, element: &XmlElement) -> Result<Occurs, SchemaCompileError> {
        let min = match element.attribute("minOccurs") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(element, format!("minOccurs '{raw}' is not a number")))?,
            None => 1,
        };
        let max = match element.attribute("maxOccurs").map(str::trim) {
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(raw) => MaxOccurs::Bounded(
                raw.parse::<u32>()
                    .map_err(|_| invalid(element, format!("maxOccurs '{raw}' is not a number")))?,
            ),
            None => MaxOccurs::Bounded(1),
        };
        Ok(Occurs { min, max })
    }

    fn is_qualified(&self, element: &XmlElement) -> bool {
        match element.attribute("form") {
            Some("qualified") => true,
            Some("unqualified") => false,
            _ => self.qualified_elements,
        }
    }

    fn particle(&mut self, element: &XmlElement) -> Result<Particle, SchemaCompileError> {
        let occurs = self.occurs(element)?;
        let term = match element.local_name() {
            "element" => match element.attribute("ref") {
                Some(qname) => {
                    let name = element
                        .resolve_qname(qname)
                        .ok_or_else(|| invalid(element, format!("ref '{qname}' uses an unbound prefix")))?;
                    if name.namespace.as_deref() == self.target_ns() {
                        Term::ElementRef(name.local)
                    } else {
                        self.note(format!("element {name} belongs to a schema that was not loaded"));
                        Term::Wildcard
                    }
                }
                None => {
                    let local = required_attr(element, "name")?;
                    let namespace = if self.is_qualified(element) { self.target_ns() } else { None };
                    let name = ExpandedName::new(namespace, local);
                    Term::Element(ElementDecl {
                        name,
                        type_ref: self.element_type(element)?,
                    })
                }
            },
            "sequence" | "choice" | "all" => {
                let mut items = Vec::new();
                for child in element.children() {
                    if child.namespace() == Some(XSD_NAMESPACE) && !is_annotation(child) {
                        items.push(self.particle(child)?);
                    }
                }
                match element.local_name() {
                    "sequence" => Term::Sequence(items),
                    "choice" => Term::Choice(items),
                    _ => Term::All(items),
                }
            }
            "group" => match self.group_ref(element) {
                Some(name) => Term::GroupRef(name),
                None => Term::Wildcard,
            },
            "any" => Term::Wildcard,
            other => {
                self.note(format!("xs:{other} inside a content model is not supported"));
                Term::Wildcard
            }
        };
        Ok(Particle { occurs, term })
    }

    /// Local name referenced by a `ref` attribute
    fn group_ref(&mut self, element: &XmlElement) -> Option<String> {
        let qname = element.attribute("ref")?;
        match element.resolve_qname(qname) {
            Some(name) if name.namespace.as_deref() == self.target_ns() => Some(name.local),
            _ => {
                self.note(format!("reference '{qname}' points outside the loaded schema"));
                None
            }
        }
    }

    fn attribute(&mut self, element: &XmlElement) -> Result<Option<AttributeDecl>, SchemaCompileError> {
        let required = element.attribute("use") == Some("required");
        if element.attribute("use") == Some("prohibited") {
            return Ok(None);
        }
        if let Some(qname) = element.attribute("ref") {
            return Ok(match element.resolve_qname(qname) {
                Some(name) if name.namespace.as_deref() == self.target_ns() => Some(AttributeDecl {
                    name: name.local,
                    type_ref: TypeRef::Any,
                    required,
                }),
                _ => None,
            });
        }
        let name = required_attr(element, "name")?.to_string();
        let type_ref = match element.attribute("type") {
            Some(qname) => self.type_ref(element, qname)?,
            None => match element.children().iter().find(|c| is_xs(c, "simpleType")) {
                Some(inline) => TypeRef::Inline(Box::new(TypeDef::Simple(self.simple_type(inline)?))),
                None => TypeRef::Builtin(Builtin::AnySimple),
            },
        };
        Ok(Some(AttributeDecl {
            name,
            type_ref,
            required,
        }))
    }

    /// Records every named reference that does not resolve
    fn check_references(&mut self) {
        let mut missing = Vec::new();
        {
            let schema = &self.schema;
            let visit_type = |type_ref: &TypeRef, missing: &mut Vec<String>| {
                if let TypeRef::Named(name) = type_ref {
                    if !schema.types.contains_key(name) {
                        missing.push(format!("type '{name}' is not defined"));
                    }
                }
            };
            let mut stack: Vec<&TypeRef> = Vec::new();
            let mut particles: Vec<&Particle> = schema.groups.values().collect();
            let mut complex: Vec<&ComplexType> = Vec::new();

            for decl in schema.elements.values() {
                stack.push(&decl.type_ref);
            }
            for definition in schema.types.values() {
                match definition {
                    TypeDef::Simple(simple) => stack.push(&simple.base),
                    TypeDef::Complex(c) => complex.push(c),
                }
            }
            for group in schema.attribute_groups.values() {
                for attribute in &group.attributes {
                    stack.push(&attribute.type_ref);
                }
                for name in &group.groups {
                    if !schema.attribute_groups.contains_key(name) {
                        missing.push(format!("attribute group '{name}' is not defined"));
                    }
                }
            }

            loop {
                if let Some(type_ref) = stack.pop() {
                    visit_type(type_ref, &mut missing);
                    if let TypeRef::Inline(definition) = type_ref {
                        match definition.as_ref() {
                            TypeDef::Simple(simple) => stack.push(&simple.base),
                            TypeDef::Complex(c) => complex.push(c),
                        }
                    }
                } else if let Some(c) = complex.pop() {
                    for attribute in &c.attributes {
                        stack.push(&attribute.type_ref);
                    }
                    for name in &c.attribute_groups {
                        if !schema.attribute_groups.contains_key(name) {
                            missing.push(format!("attribute group '{name}' is not defined"));
                        }
                    }
                    match &c.content {
                        Content::Elements { particle, .. } => particles.push(particle),
                        Content::Simple(type_ref) => stack.push(type_ref),
                        Content::Empty | Content::Any => {}
                    }
                } else if let Some(particle) = particles.pop() {
                    match &particle.term {
                        Term::Element(decl) => stack.push(&decl.type_ref),
                        Term::ElementRef(name) => {
                            if !schema.elements.contains_key(name) {
                                missing.push(format!("element '{name}' is not defined"));
                            }
                        }
                        Term::GroupRef(name) => {
                            if !schema.groups.contains_key(name) {
                                missing.push(format!("group '{name}' is not defined"));
                            }
                        }
                        Term::Sequence(items) | Term::Choice(items) | Term::All(items) => {
                            particles.extend(items.iter())
                        }
                        Term::Wildcard => {}
                    }
                } else {
                    break;
                }
            }
        }
        missing.sort();
        for message in missing {
            self.note(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:t="urn:test" targetNamespace="urn:test" elementFormDefault="qualified" version="1.2">"#;

    fn schema(body: &str) -> XsdSchema {
        XsdSchema::compile(&format!("{HEADER}{body}</xs:schema>")).unwrap()
    }

    #[test]
    fn test_reads_schema_attributes() {
        let s = schema(r#"<xs:element name="b" type="xs:string"/><xs:element name="a"/>"#);
        assert_eq!(s.target_namespace(), Some("urn:test"));
        assert_eq!(s.version(), Some("1.2"));
        assert_eq!(s.root_elements(), ["a", "b"]);
        assert!(s.is_complete());
    }

    #[test]
    fn test_not_a_schema() {
        let err = XsdSchema::compile("<html><body>Not Found</body></html>").unwrap_err();
        assert!(matches!(err, SchemaCompileError::NotASchema { .. }));
    }

    #[test]
    fn test_malformed_schema_text() {
        let err = XsdSchema::compile("<xs:schema").unwrap_err();
        assert!(matches!(err, SchemaCompileError::Malformed(_)));
    }

    #[test]
    fn test_bad_occurs_is_invalid() {
        let err = XsdSchema::compile(&format!(
            r#"{HEADER}<xs:complexType name="T"><xs:sequence><xs:element name="a" maxOccurs="many"/></xs:sequence></xs:complexType></xs:schema>"#
        ))
        .unwrap_err();
        assert!(matches!(err, SchemaCompileError::Invalid { .. }));
    }

    #[test]
    fn test_import_and_unknown_type_are_noted() {
        let s = schema(
            r#"<xs:import namespace="urn:other" schemaLocation="other.xsd"/>
               <xs:element name="a" type="t:Missing"/>"#,
        );
        assert!(!s.is_complete());
        assert!(s.unsupported().iter().any(|n| n.contains("other.xsd")));
        assert!(s.unsupported().iter().any(|n| n.contains("Missing")));
    }

    #[test]
    fn test_complex_content_is_noted() {
        let s = schema(
            r#"<xs:complexType name="T"><xs:complexContent><xs:extension base="t:U"/></xs:complexContent></xs:complexType>"#,
        );
        assert!(s.unsupported().iter().any(|n| n.contains("complexContent")));
    }
}
