//! Schema-independent structural checks
//!
//! These run on every well-formed document, with or without a schema, and
//! catch the problems that make a document unusable as a TISS message at all.

use crate::constants::{ROOT_ELEMENT, TISS_NAMESPACE, TISS_VERSION};
use crate::finding::{FindingKind, Section, ValidationFinding};
use crate::xml::XmlElement;

/// Checks root identity, version and mandatory sections
///
/// Sections are looked up in the root's own namespace so that a document
/// missing its namespace is reported once, not once per section. Sections
/// inside the body may appear at any depth below it. A root with the wrong
/// local name is not inspected further.
pub fn check_structure(root: &XmlElement) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let position = root.position();

    if root.local_name() != ROOT_ELEMENT {
        findings.push(ValidationFinding::new(
            FindingKind::UnexpectedRoot,
            format!(
                "Root element is '{}', expected '{}'",
                root.qualified_name(),
                ROOT_ELEMENT
            ),
            position,
        ));
    }

    if root.namespace() != Some(TISS_NAMESPACE) {
        let found = root.namespace().unwrap_or("no namespace");
        findings.push(ValidationFinding::new(
            FindingKind::MissingNamespace,
            format!("Root element is in {found}, expected namespace {TISS_NAMESPACE}"),
            position,
        ));
    }

    if root.local_name() != ROOT_ELEMENT {
        return findings;
    }

    match root.attribute("version") {
        Some(version) if version.trim() == TISS_VERSION => {}
        Some(version) => findings.push(ValidationFinding::new(
            FindingKind::VersionMismatch,
            format!("TISS version is '{version}', expected '{TISS_VERSION}'"),
            position,
        )),
        None => findings.push(ValidationFinding::new(
            FindingKind::VersionMismatch,
            format!("Root element has no version attribute, expected '{TISS_VERSION}'"),
            position,
        )),
    }

    let namespace = root.namespace();
    for section in Section::TOP_LEVEL {
        if root.child(namespace, section.element()).is_none() {
            findings.push(missing(section, root));
        }
    }

    if let Some(body) = root.child(namespace, Section::Body.element()) {
        for section in Section::WITHIN_BODY {
            let present = body
                .descendants()
                .any(|e| e.name().is(namespace, section.element()));
            if !present {
                findings.push(missing(section, body));
            }
        }
    }

    findings
}

fn missing(section: Section, parent: &XmlElement) -> ValidationFinding {
    ValidationFinding::new(
        FindingKind::MissingSection(section),
        format!(
            "Mandatory section '{}' is missing from '{}'",
            section.element(),
            parent.qualified_name()
        ),
        parent.position(),
    )
}
