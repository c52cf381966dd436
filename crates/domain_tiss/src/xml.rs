//! Namespace-aware XML parse tree
//!
//! A small owned element tree built on `quick_xml::Reader`. Every element
//! keeps the byte offset of its start tag as a 1-based line/column so
//! validation findings can point back into the source text. Namespace
//! prefixes are resolved while parsing; an unbound prefix makes the document
//! malformed, as do unclosed elements, stray text outside the root and a
//! second root element.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::constants::XML_NAMESPACE;

/// 1-based location in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const UNKNOWN: Position = Position { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Converts a byte offset into `text` to a line/column pair
    pub fn at_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column).unwrap_or(u32::MAX),
        }
    }
}

/// Offset to position conversion for a single forward pass over `text`
///
/// Reader offsets only grow while parsing, so each call scans just the bytes
/// since the previous one. An offset behind the cursor is resolved from the
/// start of the text.
struct Locator<'t> {
    text: &'t str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'t> Locator<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&mut self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        if offset < self.offset {
            return Position::at_offset(self.text, offset);
        }
        for ch in self.text[self.offset..offset].chars() {
            if ch == '\n' {
                self.line = self.line.saturating_add(1);
                self.column = 1;
            } else {
                self.column = self.column.saturating_add(1);
            }
        }
        self.offset = offset;
        Position::new(self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The text is not well-formed (namespace-aware) XML
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at line {}, column {}", position.line, position.column)]
pub struct XmlSyntaxError {
    pub message: String,
    pub position: Position,
}

/// Namespace URI plus local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpandedName {
    pub namespace: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.into(),
        }
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: ExpandedName,
    pub value: String,
}

type Scope = BTreeMap<String, String>;

/// One element of the parse tree
#[derive(Debug, Clone)]
pub struct XmlElement {
    name: ExpandedName,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlElement>,
    text: String,
    position: Position,
    scope: Arc<Scope>,
}

impl XmlElement {
    pub fn name(&self) -> &ExpandedName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Name as written in the source, `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.name.local),
            None => self.name.local.clone(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Value of an unqualified attribute
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First child with the given expanded name
    pub fn child(&self, namespace: Option<&str>, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name.is(namespace, local))
    }

    /// Concatenated character data directly inside this element
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_significant_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Namespace bound to `prefix` (empty string for the default namespace)
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.scope
            .get(prefix)
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// Resolves a QName-valued attribute (such as `type="ans:Foo"`) in this
    /// element's scope. Returns `None` for an unbound prefix.
    pub fn resolve_qname(&self, qname: &str) -> Option<ExpandedName> {
        let qname = qname.trim();
        match qname.split_once(':') {
            Some((prefix, local)) => {
                let ns = self.lookup_namespace(prefix)?;
                Some(ExpandedName::new(Some(ns), local))
            }
            None => Some(ExpandedName::new(self.lookup_namespace(""), qname)),
        }
    }

    /// Depth-first iterator over all elements below this one
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// A parsed, well-formed document
#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: XmlElement,
}

fn syntax_error(position: Position, message: impl Into<String>) -> XmlSyntaxError {
    XmlSyntaxError {
        message: message.into(),
        position,
    }
}

fn to_offset(raw: impl TryInto<usize>) -> usize {
    raw.try_into().unwrap_or(usize::MAX)
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

fn open_element(
    start: &BytesStart<'_>,
    parent_scope: &Arc<Scope>,
    position: Position,
) -> Result<XmlElement, XmlSyntaxError> {
    let utf8 = |bytes: &[u8]| {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| syntax_error(position, format!("invalid UTF-8 in name: {e}")))
    };

    let mut declared = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax_error(position, e.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| syntax_error(position, e.to_string()))?
            .into_owned();
        if key == "xmlns" {
            declared.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_string(), value));
        } else {
            raw_attributes.push((key, value));
        }
    }

    let scope = if declared.is_empty() {
        Arc::clone(parent_scope)
    } else {
        let mut scope = (**parent_scope).clone();
        scope.extend(declared);
        Arc::new(scope)
    };

    let resolve = |prefix: &str| {
        scope
            .get(prefix)
            .filter(|uri| !uri.is_empty())
            .cloned()
            .ok_or_else(|| {
                syntax_error(position, format!("namespace prefix '{prefix}' is not bound"))
            })
    };

    let qname = utf8(start.name().as_ref())?;
    let (prefix, local) = split_qname(&qname);
    let namespace = match prefix {
        Some(p) => Some(resolve(p)?),
        None => scope.get("").filter(|uri| !uri.is_empty()).cloned(),
    };

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for (key, value) in raw_attributes {
        let (attr_prefix, attr_local) = split_qname(&key);
        let attr_ns = match attr_prefix {
            Some(p) => Some(resolve(p)?),
            None => None,
        };
        attributes.push(XmlAttribute {
            name: ExpandedName {
                namespace: attr_ns,
                local: attr_local.to_string(),
            },
            value,
        });
    }

    Ok(XmlElement {
        name: ExpandedName {
            namespace,
            local: local.to_string(),
        },
        prefix: prefix.map(str::to_string),
        attributes,
        children: Vec::new(),
        text: String::new(),
        position,
        scope,
    })
}

impl XmlDocument {
    /// Parses `text`, failing on the first well-formedness error
    pub fn parse(text: &str) -> Result<Self, XmlSyntaxError> {
        let mut reader = Reader::from_str(text);
        let mut locator = Locator::new(text);
        let base_scope: Arc<Scope> = Arc::new(Scope::from([(
            "xml".to_string(),
            XML_NAMESPACE.to_string(),
        )]));
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let offset = to_offset(reader.buffer_position());
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let position = locator.position(to_offset(reader.error_position()));
                    return Err(syntax_error(position, e.to_string()));
                }
            };
            match event {
                Event::Start(_) | Event::Empty(_) if stack.is_empty() && root.is_some() => {
                    return Err(syntax_error(
                        locator.position(offset),
                        "document has more than one root element",
                    ));
                }
                Event::Start(start) => {
                    let scope = stack.last().map(|e| &e.scope).unwrap_or(&base_scope);
                    let element = open_element(&start, scope, locator.position(offset))?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let scope = stack.last().map(|e| &e.scope).unwrap_or(&base_scope);
                    let element = open_element(&start, scope, locator.position(offset))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| syntax_error(locator.position(offset), "unexpected end tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Event::Text(raw) => {
                    let value = raw
                        .unescape()
                        .map_err(|e| syntax_error(locator.position(offset), e.to_string()))?;
                    match stack.last_mut() {
                        Some(current) => current.text.push_str(&value),
                        None if value.trim().is_empty() => {}
                        None => {
                            return Err(syntax_error(
                                locator.position(offset),
                                "text is not allowed outside the root element",
                            ))
                        }
                    }
                }
                Event::CData(data) => match stack.last_mut() {
                    Some(current) => current.text.push_str(&String::from_utf8_lossy(&data)),
                    None => {
                        return Err(syntax_error(
                            locator.position(offset),
                            "CDATA is not allowed outside the root element",
                        ))
                    }
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(syntax_error(
                locator.position(text.len()),
                format!("element '{}' is not closed", open.qualified_name()),
            ));
        }
        let root = root
            .ok_or_else(|| syntax_error(locator.position(text.len()), "document has no root element"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://www.ans.gov.br/padroes/tiss/schemas";

    #[test]
    fn test_resolves_prefixed_names() {
        let doc = XmlDocument::parse(&format!(
            "<?xml version=\"1.0\"?>\n<ans:a xmlns:ans=\"{NS}\" version=\"1\">\n  <ans:b>x &amp; y</ans:b>\n</ans:a>"
        ))
        .unwrap();
        let root = doc.root();
        assert!(root.name().is(Some(NS), "a"));
        assert_eq!(root.attribute("version"), Some("1"));
        assert_eq!(root.position(), Position::new(2, 1));

        let b = root.child(Some(NS), "b").unwrap();
        assert_eq!(b.text(), "x & y");
        assert_eq!(b.position(), Position::new(3, 3));
        assert_eq!(b.qualified_name(), "ans:b");
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() {
        let doc = XmlDocument::parse("<a xmlns=\"urn:x\" k=\"v\"><b/></a>").unwrap();
        assert_eq!(doc.root().namespace(), Some("urn:x"));
        assert_eq!(doc.root().attributes()[0].name.namespace, None);
        assert_eq!(doc.root().children()[0].namespace(), Some("urn:x"));
    }

    #[test]
    fn test_unbound_prefix_is_malformed() {
        let err = XmlDocument::parse("<x:a/>").unwrap_err();
        assert!(err.message.contains("not bound"));
    }

    #[test]
    fn test_unterminated_tag_reports_location() {
        let err = XmlDocument::parse("<not valid xml").unwrap_err();
        assert_eq!(err.position.line, 1);
        assert!(err.position.column >= 1);
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = XmlDocument::parse("<a>\n<b></c>\n</a>").unwrap_err();
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn test_unclosed_root() {
        assert!(XmlDocument::parse("<a><b/>").is_err());
    }

    #[test]
    fn test_second_root_rejected() {
        let err = XmlDocument::parse("<a/>\n<b/>").unwrap_err();
        assert_eq!(err.position, Position::new(2, 1));
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("   \n").is_err());
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = XmlDocument::parse("<a><b><c/></b><d/></a>").unwrap();
        let names: Vec<_> = doc.root().descendants().map(|e| e.local_name().to_string()).collect();
        assert_eq!(names, ["b", "c", "d"]);
    }

    #[test]
    fn test_position_counts_characters_not_bytes() {
        assert_eq!(Position::at_offset("é\nçã<", 7), Position::new(2, 3));
    }

    #[test]
    fn test_locator_matches_full_scan() {
        let text = "<a>\n  <b>é</b>\n<ç/></a>";
        let mut locator = Locator::new(text);
        for offset in [0, 4, 6, 9, 12, 14, 17, text.len()] {
            assert_eq!(locator.position(offset), Position::at_offset(text, offset));
        }
        assert_eq!(locator.position(4), Position::at_offset(text, 4));
    }

    #[test]
    fn test_large_document_positions_stay_linear() {
        let count = 100_000;
        let mut text = String::with_capacity(count * 5 + 16);
        text.push_str("<r>\n");
        for _ in 0..count {
            text.push_str("<a/>\n");
        }
        text.push_str("</r>");

        let started = std::time::Instant::now();
        let doc = XmlDocument::parse(&text).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(10));

        let children = &doc.root().children;
        assert_eq!(children.len(), count);
        assert_eq!(children[count - 1].position, Position::new(count as u32 + 1, 1));
    }

    #[test]
    fn test_single_line_document_positions_stay_linear() {
        let count = 100_000;
        let text = format!("<r>{}</r>", "<a/>".repeat(count));

        let started = std::time::Instant::now();
        let doc = XmlDocument::parse(&text).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(doc.root().children[1].position, Position::new(1, 8));
    }

    #[test]
    fn test_resolve_qname_uses_scope() {
        let doc = XmlDocument::parse("<s xmlns:t=\"urn:t\" type=\"t:Foo\"/>").unwrap();
        let root = doc.root();
        let name = root.resolve_qname(root.attribute("type").unwrap()).unwrap();
        assert!(name.is(Some("urn:t"), "Foo"));
        assert!(root.resolve_qname("u:Bar").is_none());
    }
}
