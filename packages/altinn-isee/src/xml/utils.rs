//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

use crate::config::XSI_NAMESPACE;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use altinn_isee::xml::get_tag_name;
///
/// let xml = r#"<a:Skjema xmlns:a="urn:altinn"><a:InternInfo/></a:Skjema>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "Skjema");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Get all element children of a node.
///
/// Excludes text nodes, comments and processing instructions.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Get the trimmed direct text of a node.
///
/// Returns `None` when the node has no text or only whitespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use altinn_isee::xml::get_text;
///
/// let doc = Document::parse("<a>  42 </a>").unwrap();
/// assert_eq!(get_text(doc.root_element()).as_deref(), Some("42"));
///
/// let doc = Document::parse("<a>   </a>").unwrap();
/// assert_eq!(get_text(doc.root_element()), None);
/// ```
pub fn get_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Check whether an element is marked `xsi:nil="true"`.
pub fn is_nil(node: Node<'_, '_>) -> bool {
    matches!(
        node.attribute((XSI_NAMESPACE, "nil")),
        Some("true") | Some("1")
    )
}

/// Attributes of an element as `(local name, value)` pairs in source order.
pub fn attribute_pairs(node: Node<'_, '_>) -> Vec<(String, String)> {
    node.attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect()
}
