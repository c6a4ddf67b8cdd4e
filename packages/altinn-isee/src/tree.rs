//! Document loader that normalizes Altinn XML into an ordered tree.
//!
//! Every element becomes a [`NormalizedNode`]. Sibling elements sharing a tag
//! are collapsed into a single [`Child::Group`]; a tag that occurs once stays a
//! [`Child::Single`]. Tags iterate in order of first occurrence and group
//! members keep source order, since ordinal suffixes depend on it.

use std::fs;
use std::io::Read;
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use roxmltree::{Document, Node, ParsingOptions};

use crate::error::Result;
use crate::xml::{attribute_pairs, element_children, get_tag_name, get_text, is_nil};

/// Children of one tag under a parent element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// The tag occurred exactly once.
    Single(NormalizedNode),
    /// The tag occurred more than once (a table).
    Group(Vec<NormalizedNode>),
}

impl Child {
    /// All nodes behind this entry, in source order.
    pub fn members(&self) -> &[NormalizedNode] {
        match self {
            Self::Single(node) => std::slice::from_ref(node),
            Self::Group(nodes) => nodes,
        }
    }
}

/// One XML element with its text, attributes and grouped children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNode {
    /// Local element name.
    pub tag: String,

    /// Trimmed direct text, `None` when empty or `xsi:nil`.
    pub text: Option<String>,

    /// Attributes as `(local name, value)` pairs. Not flattened.
    pub attributes: Vec<(String, String)>,

    /// Child elements keyed by tag, in order of first occurrence.
    pub children: IndexMap<String, Child>,
}

impl NormalizedNode {
    /// Create an empty node.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            attributes: Vec::new(),
            children: IndexMap::new(),
        }
    }

    /// Create a scalar node with text.
    #[must_use]
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(tag)
        }
    }

    /// Add a child and return the node.
    #[must_use]
    pub fn with_child(mut self, child: NormalizedNode) -> Self {
        self.push_child(child);
        self
    }

    /// Add a child, turning a `Single` into a `Group` on the second occurrence.
    pub fn push_child(&mut self, child: NormalizedNode) {
        match self.children.entry(child.tag.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(Child::Single(child));
            }
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                if let Child::Group(members) = &mut *slot {
                    members.push(child);
                } else if let Child::Single(first) =
                    std::mem::replace(slot, Child::Group(Vec::new()))
                {
                    *slot = Child::Group(vec![first, child]);
                }
            }
        }
    }

    /// Whether this node has no child elements.
    pub fn is_scalar(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up the children for a tag.
    pub fn child(&self, tag: &str) -> Option<&Child> {
        self.children.get(tag)
    }

    /// The first node with the given tag, whether single or grouped.
    pub fn first_child(&self, tag: &str) -> Option<&NormalizedNode> {
        self.child(tag).and_then(|child| child.members().first())
    }

    /// Whether any descendant of this node is a repeated group.
    pub fn contains_group(&self) -> bool {
        self.children.values().any(|child| match child {
            Child::Group(_) => true,
            Child::Single(node) => node.contains_group(),
        })
    }
}

/// A parsed form: the root element and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub root: NormalizedNode,
}

impl NormalizedDocument {
    /// A top-level block (direct child of the root) by tag.
    pub fn block(&self, tag: &str) -> Option<&NormalizedNode> {
        self.root.first_child(tag)
    }
}

/// Parse raw XML bytes into a normalized tree.
///
/// Fails with [`AltinnError::MalformedDocument`](crate::AltinnError::MalformedDocument)
/// when the input is not well-formed XML or not UTF-8. A `DOCTYPE`
/// declaration is accepted. Schema validity is not checked.
///
/// # Examples
/// ```
/// use altinn_isee::tree::{load_bytes, Child};
///
/// let doc = load_bytes(b"<Skjema><a>1</a><b>2</b><b>3</b></Skjema>").unwrap();
/// assert!(matches!(doc.root.child("a"), Some(Child::Single(_))));
/// assert!(matches!(doc.root.child("b"), Some(Child::Group(g)) if g.len() == 2));
/// ```
pub fn load_bytes(bytes: &[u8]) -> Result<NormalizedDocument> {
    let xml = decode(bytes)?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;
    let root = normalize(doc.root_element());

    tracing::debug!(root = %root.tag, blocks = root.children.len(), "Normalized document");

    Ok(NormalizedDocument { root })
}

/// Read all bytes from `reader` and normalize them.
pub fn load_reader<R: Read>(mut reader: R) -> Result<NormalizedDocument> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    load_bytes(&bytes)
}

/// Read a file into memory, close it, then normalize its contents.
pub fn load_file(path: &Path) -> Result<NormalizedDocument> {
    let bytes = fs::read(path)?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "Read XML file");
    load_bytes(&bytes)
}

fn decode(bytes: &[u8]) -> Result<&str> {
    let xml = std::str::from_utf8(bytes)?;
    Ok(xml.strip_prefix('\u{feff}').unwrap_or(xml))
}

fn normalize(node: Node<'_, '_>) -> NormalizedNode {
    let mut normalized = NormalizedNode::new(get_tag_name(node));
    normalized.attributes = attribute_pairs(node);
    normalized.text = if is_nil(node) { None } else { get_text(node) };

    for child in element_children(node) {
        normalized.push_child(normalize(child));
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AltinnError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_singleton_never_becomes_group() {
        let doc = load_bytes(b"<root><a>1</a></root>").unwrap();
        assert_eq!(
            doc.root.child("a"),
            Some(&Child::Single(NormalizedNode::leaf("a", "1")))
        );
    }

    #[test]
    fn test_repeated_siblings_become_group_in_order() {
        let doc = load_bytes(b"<root><r>1</r><r>2</r><r>3</r></root>").unwrap();
        let Some(Child::Group(members)) = doc.root.child("r") else {
            panic!("expected group");
        };
        let texts: Vec<_> = members.iter().map(|m| m.text.as_deref()).collect();
        assert_eq!(texts, vec![Some("1"), Some("2"), Some("3")]);
    }

    #[test]
    fn test_first_occurrence_order_preserved() {
        let doc = load_bytes(b"<root><z/><a/><z/><m/></root>").unwrap();
        let tags: Vec<_> = doc.root.children.keys().map(String::as_str).collect();
        assert_eq!(tags, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_whitespace_and_empty_text_is_none() {
        let doc = load_bytes(b"<root><a>   </a><b/></root>").unwrap();
        assert_eq!(doc.root.first_child("a").unwrap().text, None);
        assert_eq!(doc.root.first_child("b").unwrap().text, None);
    }

    #[test]
    fn test_xsi_nil_is_none() {
        let xml = br#"<root xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><a xsi:nil="true">x</a></root>"#;
        let doc = load_bytes(xml).unwrap();
        let a = doc.root.first_child("a").unwrap();
        assert_eq!(a.text, None);
        assert_eq!(a.attributes, vec![("nil".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_namespaces_are_stripped() {
        let xml = br#"<s:Skjema xmlns:s="urn:altinn:skjema"><s:InternInfo><s:delregNr>9</s:delregNr></s:InternInfo></s:Skjema>"#;
        let doc = load_bytes(xml).unwrap();
        assert_eq!(doc.root.tag, "Skjema");
        let info = doc.block("InternInfo").unwrap();
        assert_eq!(info.first_child("delregNr").unwrap().text.as_deref(), Some("9"));
    }

    #[test]
    fn test_byte_order_mark_accepted() {
        let doc = load_bytes("\u{feff}<root><a>1</a></root>".as_bytes()).unwrap();
        assert_eq!(doc.root.tag, "root");
    }

    #[test]
    fn test_malformed_document() {
        let err = load_bytes(b"<root><a></root>").unwrap_err();
        assert!(matches!(err, AltinnError::MalformedDocument(_)));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = load_bytes(&[b'<', b'a', b'>', 0xff, b'<', b'/', b'a', b'>']).unwrap_err();
        assert!(matches!(err, AltinnError::MalformedDocument(_)));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(matches!(
            load_bytes(b""),
            Err(AltinnError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_doctype_accepted() {
        let xml = br#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE Skjema>
<Skjema><SkjemaData><a>1</a></SkjemaData></Skjema>"#;
        let doc = load_bytes(xml).unwrap();
        let data = doc.block("SkjemaData").unwrap();
        assert_eq!(data.first_child("a").unwrap().text.as_deref(), Some("1"));
    }

    #[test]
    fn test_doctype_with_internal_subset_accepted() {
        let xml = br#"<!DOCTYPE Skjema [<!ENTITY org "Statistisk sentralbyraa">]><Skjema><navn>&org;</navn></Skjema>"#;
        let doc = load_bytes(xml).unwrap();
        assert_eq!(
            doc.root.first_child("navn").unwrap().text.as_deref(),
            Some("Statistisk sentralbyraa")
        );
    }

    #[test]
    fn test_mixed_content_text_kept_on_node() {
        let doc = load_bytes(b"<root><note>hello<b>x</b></note></root>").unwrap();
        let note = doc.root.first_child("note").unwrap();
        assert_eq!(note.text.as_deref(), Some("hello"));
        assert!(!note.is_scalar());
    }

    #[test]
    fn test_load_reader() {
        let doc = load_reader(&b"<root><a>1</a></root>"[..]).unwrap();
        assert_eq!(doc.root.first_child("a").unwrap().text.as_deref(), Some("1"));
    }

    #[test]
    fn test_contains_group() {
        let flat = NormalizedNode::new("rad")
            .with_child(NormalizedNode::leaf("a", "1"))
            .with_child(NormalizedNode::leaf("b", "2"));
        assert!(!flat.contains_group());

        let nested = NormalizedNode::new("rad").with_child(
            NormalizedNode::new("inner")
                .with_child(NormalizedNode::leaf("x", "1"))
                .with_child(NormalizedNode::leaf("x", "2")),
        );
        assert!(nested.contains_group());
    }
}
