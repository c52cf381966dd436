//! Instance validation against a compiled schema

use std::collections::{BTreeSet, HashSet};

use crate::constants::{XML_NAMESPACE, XSI_NAMESPACE};
use crate::finding::{FindingKind, ValidationFinding};
use crate::xml::{ExpandedName, Position, XmlAttribute, XmlDocument, XmlElement};

use super::datatypes::{Builtin, Facets, Violation};
use super::model::{AttributeDecl, ComplexType, Content, MaxOccurs, Particle, Term, TypeDef, TypeRef};
use super::XsdSchema;

/// Guards against cyclic type, group and attribute-group references
const MAX_DEPTH: usize = 64;

pub(super) fn validate_document(schema: &XsdSchema, document: &XmlDocument) -> Vec<ValidationFinding> {
    let mut validator = Validator {
        schema,
        findings: Vec::new(),
    };
    let root = document.root();
    match global_decl(schema, root.name()) {
        Some(type_ref) => validator.element(root, type_ref, 0),
        None => validator.report(
            "cvc-elt.1",
            root.position(),
            format!("Cannot find the declaration of element '{}'.", root.qualified_name()),
        ),
    }
    validator.findings.sort_by_key(ValidationFinding::position);
    validator.findings
}

fn global_decl<'s>(schema: &'s XsdSchema, name: &ExpandedName) -> Option<&'s TypeRef> {
    schema
        .elements
        .get(&name.local)
        .filter(|decl| decl.name == *name)
        .map(|decl| &decl.type_ref)
}

fn is_ambient(attribute: &XmlAttribute) -> bool {
    matches!(
        attribute.name.namespace.as_deref(),
        Some(XSI_NAMESPACE) | Some(XML_NAMESPACE)
    )
}

fn attribute_label(attribute: &XmlAttribute) -> String {
    attribute.name.local.clone()
}

/// What a type reference turns out to be once named types are looked up
enum Resolved<'s> {
    Any,
    Simple(&'s TypeRef),
    Complex(&'s ComplexType),
}

struct Validator<'s> {
    schema: &'s XsdSchema,
    findings: Vec<ValidationFinding>,
}

impl<'s> Validator<'s> {
    fn report(&mut self, code: &'static str, position: Position, message: String) {
        self.findings
            .push(ValidationFinding::new(FindingKind::SchemaViolation(code), message, position));
    }

    fn report_violation(&mut self, violation: Violation, position: Position, context: String) {
        self.report(violation.code, position, format!("{} ({})", violation.message, context));
    }

    fn resolve(&self, type_ref: &'s TypeRef) -> Resolved<'s> {
        match type_ref {
            TypeRef::Any => Resolved::Any,
            TypeRef::Builtin(_) => Resolved::Simple(type_ref),
            TypeRef::Named(name) => match self.schema.types.get(name) {
                Some(TypeDef::Simple(_)) => Resolved::Simple(type_ref),
                Some(TypeDef::Complex(complex)) => Resolved::Complex(complex),
                None => Resolved::Any,
            },
            TypeRef::Inline(definition) => match definition.as_ref() {
                TypeDef::Simple(_) => Resolved::Simple(type_ref),
                TypeDef::Complex(complex) => Resolved::Complex(complex),
            },
        }
    }

    /// Checks a simple value: the primitive lexical space first, then each
    /// restriction step from the base outwards
    fn check_simple(&self, type_ref: &'s TypeRef, raw: &str) -> Result<(), Violation> {
        let mut steps: Vec<&'s Facets> = Vec::new();
        let mut current = type_ref;
        let primitive = loop {
            if steps.len() > MAX_DEPTH {
                break Builtin::AnySimple;
            }
            let definition = match current {
                TypeRef::Builtin(builtin) => break *builtin,
                TypeRef::Any => break Builtin::AnySimple,
                TypeRef::Named(name) => self.schema.types.get(name),
                TypeRef::Inline(definition) => Some(definition.as_ref()),
            };
            match definition {
                Some(TypeDef::Simple(simple)) => {
                    steps.push(&simple.facets);
                    current = &simple.base;
                }
                _ => break Builtin::AnySimple,
            }
        };

        primitive.check(raw)?;
        for facets in steps.iter().rev() {
            facets.check(primitive, raw)?;
        }
        Ok(())
    }

    fn element(&mut self, element: &XmlElement, type_ref: &'s TypeRef, depth: usize) {
        if depth > MAX_DEPTH * 4 {
            return;
        }
        match self.resolve(type_ref) {
            Resolved::Any => {}
            Resolved::Simple(simple) => self.simple_element(element, simple),
            Resolved::Complex(complex) => self.complex_element(element, complex, depth),
        }
    }

    fn simple_element(&mut self, element: &XmlElement, type_ref: &'s TypeRef) {
        for attribute in element.attributes().iter().filter(|a| !is_ambient(a)) {
            self.report(
                "cvc-complex-type.3.2.2",
                element.position(),
                format!(
                    "Attribute '{}' is not allowed to appear in element '{}'.",
                    attribute_label(attribute),
                    element.qualified_name()
                ),
            );
        }
        if let Some(child) = element.children().first() {
            self.report(
                "cvc-type.3.1.2",
                child.position(),
                format!(
                    "Element '{}' is a simple type, so it must have no element information item [children].",
                    element.qualified_name()
                ),
            );
            return;
        }
        if let Err(violation) = self.check_simple(type_ref, element.text()) {
            let context = format!("element '{}'", element.qualified_name());
            self.report_violation(violation, element.position(), context);
        }
    }

    fn collect_attributes(
        &self,
        complex: &'s ComplexType,
    ) -> (Vec<&'s AttributeDecl>, bool) {
        let mut declared: Vec<&'s AttributeDecl> = complex.attributes.iter().collect();
        let mut any_attribute = complex.any_attribute;
        let mut pending: Vec<&'s String> = complex.attribute_groups.iter().collect();
        let mut seen: HashSet<&'s String> = HashSet::new();

        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            match self.schema.attribute_groups.get(name) {
                Some(group) => {
                    declared.extend(group.attributes.iter());
                    any_attribute |= group.any_attribute;
                    pending.extend(group.groups.iter());
                }
                None => any_attribute = true,
            }
        }
        (declared, any_attribute)
    }

    fn complex_element(&mut self, element: &XmlElement, complex: &'s ComplexType, depth: usize) {
        let (declared, any_attribute) = self.collect_attributes(complex);

        for attribute in element.attributes().iter().filter(|a| !is_ambient(a)) {
            let decl = declared
                .iter()
                .find(|d| attribute.name.namespace.is_none() && d.name == attribute.name.local)
                .copied();
            match decl {
                Some(decl) => {
                    if let Err(violation) = self.check_simple(&decl.type_ref, &attribute.value) {
                        let context = format!(
                            "attribute '{}' on element '{}'",
                            attribute_label(attribute),
                            element.qualified_name()
                        );
                        self.report_violation(violation, element.position(), context);
                    }
                }
                None if any_attribute => {}
                None => self.report(
                    "cvc-complex-type.3.2.2",
                    element.position(),
                    format!(
                        "Attribute '{}' is not allowed to appear in element '{}'.",
                        attribute_label(attribute),
                        element.qualified_name()
                    ),
                ),
            }
        }

        for decl in declared.iter().filter(|d| d.required) {
            if element.attribute(&decl.name).is_none() {
                self.report(
                    "cvc-complex-type.4",
                    element.position(),
                    format!(
                        "Attribute '{}' must appear on element '{}'.",
                        decl.name,
                        element.qualified_name()
                    ),
                );
            }
        }

        match &complex.content {
            Content::Any => {}
            Content::Empty => {
                if !element.children().is_empty() || element.has_significant_text() {
                    self.report(
                        "cvc-complex-type.2.1",
                        element.position(),
                        format!(
                            "Element '{}' must have no character or element information item [children], because the type's content type is empty.",
                            element.qualified_name()
                        ),
                    );
                }
            }
            Content::Simple(type_ref) => {
                if let Some(child) = element.children().first() {
                    self.report(
                        "cvc-complex-type.2.2",
                        child.position(),
                        format!(
                            "Element '{}' must have no element [children], and the value must be valid.",
                            element.qualified_name()
                        ),
                    );
                } else if let Err(violation) = self.check_simple(type_ref, element.text()) {
                    let context = format!("element '{}'", element.qualified_name());
                    self.report_violation(violation, element.position(), context);
                }
            }
            Content::Elements { particle, mixed } => {
                if !mixed && element.has_significant_text() {
                    self.report(
                        "cvc-complex-type.2.3",
                        element.position(),
                        format!(
                            "Element '{}' cannot have character [children], because the type's content type is element-only.",
                            element.qualified_name()
                        ),
                    );
                }
                self.element_content(element, particle, depth);
            }
        }
    }

    fn element_content(&mut self, element: &XmlElement, particle: &'s Particle, depth: usize) {
        let children = element.children();
        let mut matcher = Matcher::new(self.schema, children);
        let end = matcher.particle(particle, 0);

        let consumed = match end {
            Some(end) if end == children.len() => end,
            Some(end) => {
                let child = &children[end];
                let expected = matcher.expected_at(end);
                if expected.is_empty() {
                    self.report(
                        "cvc-complex-type.2.4.d",
                        child.position(),
                        format!(
                            "Invalid content was found starting with element '{}'. No child element is expected at this point.",
                            child.qualified_name()
                        ),
                    );
                } else {
                    self.report(
                        "cvc-complex-type.2.4.a",
                        child.position(),
                        format!(
                            "Invalid content was found starting with element '{}'. One of '{}' is expected.",
                            child.qualified_name(),
                            expected
                        ),
                    );
                }
                end
            }
            None => {
                let at = matcher.furthest;
                let expected = matcher.expected_at(at);
                match children.get(at) {
                    Some(child) => self.report(
                        "cvc-complex-type.2.4.a",
                        child.position(),
                        format!(
                            "Invalid content was found starting with element '{}'. One of '{}' is expected.",
                            child.qualified_name(),
                            expected
                        ),
                    ),
                    None => self.report(
                        "cvc-complex-type.2.4.b",
                        element.position(),
                        format!(
                            "The content of element '{}' is not complete. One of '{}' is expected.",
                            element.qualified_name(),
                            expected
                        ),
                    ),
                }
                at
            }
        };

        let assigned = matcher.assigned;
        for (child, type_ref) in children.iter().zip(assigned).take(consumed) {
            if let Some(type_ref) = type_ref {
                self.element(child, type_ref, depth + 1);
            }
        }
    }
}

/// Greedy content-model matcher over one element's children.
///
/// Each particle consumes as many children as it can without backtracking,
/// which is exact for the deterministic content models XSD requires. The
/// furthest position at which an element test failed, and the names that
/// were expected there, drive the error message.
struct Matcher<'s, 'd> {
    schema: &'s XsdSchema,
    children: &'d [XmlElement],
    assigned: Vec<Option<&'s TypeRef>>,
    furthest: usize,
    expected: BTreeSet<String>,
    group_depth: usize,
}

impl<'s, 'd> Matcher<'s, 'd> {
    fn new(schema: &'s XsdSchema, children: &'d [XmlElement]) -> Self {
        Self {
            schema,
            children,
            assigned: vec![None; children.len()],
            furthest: 0,
            expected: BTreeSet::new(),
            group_depth: 0,
        }
    }

    fn expected_at(&self, position: usize) -> String {
        if position == self.furthest {
            self.expected.iter().cloned().collect::<Vec<_>>().join(", ")
        } else {
            String::new()
        }
    }

    fn fail(&mut self, position: usize, expected: String) {
        if position > self.furthest {
            self.furthest = position;
            self.expected.clear();
        }
        if position == self.furthest {
            self.expected.insert(expected);
        }
    }

    /// Position after the particle, or `None` if its minimum was not met
    fn particle(&mut self, particle: &'s Particle, start: usize) -> Option<usize> {
        let mut count: u32 = 0;
        let mut position = start;
        loop {
            if let MaxOccurs::Bounded(max) = particle.occurs.max {
                if count >= max {
                    break;
                }
            }
            match self.term(&particle.term, position) {
                Some(next) if next > position => {
                    position = next;
                    count += 1;
                }
                // An empty match can be repeated to satisfy any minimum.
                Some(_) => return Some(position),
                None => break,
            }
        }
        (count >= particle.occurs.min).then_some(position)
    }

    fn term(&mut self, term: &'s Term, position: usize) -> Option<usize> {
        match term {
            Term::Element(decl) => self.element(&decl.name, &decl.type_ref, position),
            Term::ElementRef(name) => match self.schema.elements.get(name) {
                Some(decl) => self.element(&decl.name, &decl.type_ref, position),
                None => self.wildcard(position),
            },
            Term::Wildcard => self.wildcard(position),
            Term::Sequence(items) => {
                let mut position = position;
                for item in items {
                    position = self.particle(item, position)?;
                }
                Some(position)
            }
            Term::Choice(items) => {
                let mut empty = None;
                for item in items {
                    match self.particle(item, position) {
                        Some(next) if next > position => return Some(next),
                        Some(next) => {
                            empty.get_or_insert(next);
                        }
                        None => {}
                    }
                }
                empty
            }
            Term::All(items) => self.all(items, position),
            Term::GroupRef(name) => match self.schema.groups.get(name) {
                Some(group) if self.group_depth < MAX_DEPTH => {
                    self.group_depth += 1;
                    let result = self.particle(group, position);
                    self.group_depth -= 1;
                    result
                }
                _ => {
                    for index in position..self.children.len() {
                        self.assigned[index] = None;
                    }
                    Some(self.children.len())
                }
            },
        }
    }

    fn all(&mut self, items: &'s [Particle], start: usize) -> Option<usize> {
        let mut used = vec![false; items.len()];
        let mut position = start;
        'next: loop {
            for (index, item) in items.iter().enumerate() {
                if used[index] {
                    continue;
                }
                if let Some(next) = self.particle(item, position) {
                    if next > position {
                        used[index] = true;
                        position = next;
                        continue 'next;
                    }
                }
            }
            break;
        }
        for (index, item) in items.iter().enumerate() {
            if !used[index] && item.occurs.min > 0 {
                self.particle(item, position)?;
            }
        }
        Some(position)
    }

    fn element(&mut self, name: &ExpandedName, type_ref: &'s TypeRef, position: usize) -> Option<usize> {
        match self.children.get(position) {
            Some(child) if child.name() == name => {
                self.assigned[position] = Some(type_ref);
                Some(position + 1)
            }
            _ => {
                self.fail(position, name.local.clone());
                None
            }
        }
    }

    fn wildcard(&mut self, position: usize) -> Option<usize> {
        if position < self.children.len() {
            self.assigned[position] = None;
            Some(position + 1)
        } else {
            self.fail(position, "*".to_string());
            None
        }
    }
}
