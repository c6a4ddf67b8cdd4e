//! Flattening engine that turns a normalized form into named fields.

use std::collections::HashSet;

use super::types::{FlatField, Flattened};
use crate::config::{ordinal_suffix, FlattenConfig, FIELD_SEPARATOR};
use crate::tree::{Child, NormalizedDocument, NormalizedNode};

/// Engine for flattening the data block of an Altinn form.
///
/// Walks the tree depth-first in source order. Scalars keep their tag as
/// field name, members of a repeated group get an ordinal suffix, and groups
/// that contain another group are skipped with a warning.
#[derive(Debug, Clone, Default)]
pub struct FlattenEngine {
    config: FlattenConfig,
}

/// Accumulator threaded through the recursive walk.
#[derive(Default)]
struct Walk {
    out: Flattened,
    seen: HashSet<String>,
}

impl Walk {
    fn emit(&mut self, name: String, value: Option<String>, depth: usize) {
        let name = if self.seen.contains(&name) {
            let unique = (2..)
                .map(|n| format!("{name}{FIELD_SEPARATOR}{n}"))
                .find(|candidate| !self.seen.contains(candidate))
                .unwrap_or_default();
            tracing::debug!(original = %name, renamed = %unique, "Duplicate field name");
            unique
        } else {
            name
        };

        self.seen.insert(name.clone());
        self.out.fields.push(FlatField::new(name, value, depth));
    }

    fn warn(&mut self, path: String) {
        tracing::warn!(
            path = %path,
            "Form contains a table within a table, fields not flattened"
        );
        self.out.warnings.push(path);
    }
}

impl FlattenEngine {
    /// Create a new engine.
    #[must_use]
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    /// Flatten the data block of a document.
    ///
    /// When the data block is absent, every top-level block except the
    /// metadata block is flattened instead.
    pub fn flatten_document(&self, doc: &NormalizedDocument) -> Flattened {
        if let Some(block) = doc.block(&self.config.data_block) {
            return self.flatten(block);
        }

        tracing::warn!(
            data_block = %self.config.data_block,
            "Data block not found, flattening all blocks except metadata"
        );
        let mut root = doc.root.clone();
        root.children.shift_remove(&self.config.metadata_block);
        self.flatten(&root)
    }

    /// Flatten the children of `block` into fields and warnings.
    pub fn flatten(&self, block: &NormalizedNode) -> Flattened {
        let mut walk = Walk::default();
        let mut path = Vec::new();
        walk_container(block, &mut path, None, 0, &mut walk);

        tracing::debug!(
            fields = walk.out.fields.len(),
            warnings = walk.out.warnings.len(),
            "Flattened data block"
        );
        walk.out
    }
}

/// Flatten the children of a container.
///
/// `path` holds the container tags below the data block, `ordinal` is set
/// once the walk is inside a group member. Text mixed in between child
/// elements has no field name and is only logged.
fn walk_container<'a>(
    node: &'a NormalizedNode,
    path: &mut Vec<&'a str>,
    ordinal: Option<usize>,
    depth: usize,
    walk: &mut Walk,
) {
    if let Some(text) = &node.text {
        let location = if path.is_empty() {
            node.tag.clone()
        } else {
            qualified_path(path)
        };
        tracing::warn!(
            path = %location,
            text = %text,
            "Element has both text and child elements, text not flattened"
        );
    }

    for (tag, child) in &node.children {
        match child {
            Child::Single(single) if single.is_scalar() => {
                walk.emit(field_name(tag, ordinal), single.text.clone(), depth);
            }
            Child::Single(single) => {
                path.push(tag);
                walk_container(single, path, ordinal, depth + 1, walk);
                path.pop();
            }
            Child::Group(members) => {
                path.push(tag);
                if members.iter().any(NormalizedNode::contains_group) {
                    walk.warn(qualified_path(path));
                } else {
                    walk_group(tag, members, path, depth, walk);
                }
                path.pop();
            }
        }
    }
}

/// Flatten each member of a table with its 1-based ordinal.
fn walk_group<'a>(
    tag: &str,
    members: &'a [NormalizedNode],
    path: &mut Vec<&'a str>,
    depth: usize,
    walk: &mut Walk,
) {
    for (index, member) in members.iter().enumerate() {
        let ordinal = Some(index + 1);
        if member.is_scalar() {
            walk.emit(field_name(tag, ordinal), member.text.clone(), depth);
        } else {
            walk_container(member, path, ordinal, depth + 1, walk);
        }
    }
}

fn field_name(tag: &str, ordinal: Option<usize>) -> String {
    match ordinal {
        Some(n) => format!("{tag}{}", ordinal_suffix(n)),
        None => tag.to_string(),
    }
}

fn qualified_path(path: &[&str]) -> String {
    let separator = FIELD_SEPARATOR.to_string();
    path.join(separator.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::load_bytes;
    use pretty_assertions::assert_eq;

    fn flatten_xml(xml: &str) -> Flattened {
        let doc = load_bytes(xml.as_bytes()).unwrap();
        FlattenEngine::default().flatten_document(&doc)
    }

    fn names(flat: &Flattened) -> Vec<&str> {
        flat.fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn pairs(flat: &Flattened) -> Vec<(&str, Option<&str>)> {
        flat.fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_deref()))
            .collect()
    }

    #[test]
    fn test_scalars_named_by_tag() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData><foo>1</foo><bar>2</bar><baz/></SkjemaData></Skjema>",
        );
        assert_eq!(
            pairs(&flat),
            vec![("foo", Some("1")), ("bar", Some("2")), ("baz", None)]
        );
        assert!(flat.warnings.is_empty());
    }

    #[test]
    fn test_singleton_containers_are_transparent() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData><Kontakt><navn>Ola</navn><Adresse><postnr>0001</postnr></Adresse></Kontakt></SkjemaData></Skjema>",
        );
        assert_eq!(pairs(&flat), vec![("navn", Some("Ola")), ("postnr", Some("0001"))]);
        assert_eq!(flat.fields[0].depth, 1);
        assert_eq!(flat.fields[1].depth, 2);
    }

    #[test]
    fn test_repeated_scalars_get_ordinals_in_source_order() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData><item>c</item><item>a</item><item>b</item></SkjemaData></Skjema>",
        );
        assert_eq!(
            pairs(&flat),
            vec![
                ("item_001", Some("c")),
                ("item_002", Some("a")),
                ("item_003", Some("b"))
            ]
        );
    }

    #[test]
    fn test_table_rows_suffix_their_fields() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData>\
                <Rad><Areal>10</Areal><Vekst>bygg</Vekst></Rad>\
                <Rad><Areal>20</Areal><Vekst>havre</Vekst></Rad>\
            </SkjemaData></Skjema>",
        );
        assert_eq!(
            pairs(&flat),
            vec![
                ("Areal_001", Some("10")),
                ("Vekst_001", Some("bygg")),
                ("Areal_002", Some("20")),
                ("Vekst_002", Some("havre"))
            ]
        );
        assert!(flat.fields.iter().all(|f| f.depth == 1));
    }

    #[test]
    fn test_table_member_with_singleton_container() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData>\
                <Rad><Gjodsel><Mengde>5</Mengde></Gjodsel></Rad>\
                <Rad><Gjodsel><Mengde>7</Mengde></Gjodsel></Rad>\
            </SkjemaData></Skjema>",
        );
        assert_eq!(
            pairs(&flat),
            vec![("Mengde_001", Some("5")), ("Mengde_002", Some("7"))]
        );
        assert!(flat.warnings.is_empty());
    }

    #[test]
    fn test_table_in_table_is_skipped_with_one_warning() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData>\
                <foo>1</foo>\
                <Seksjon><Group><Navn>a</Navn><Linje><x>1</x></Linje><Linje><x>2</x></Linje></Group>\
                <Group><Navn>b</Navn><Linje><x>3</x></Linje><Linje><x>4</x></Linje></Group></Seksjon>\
                <bar>2</bar>\
            </SkjemaData></Skjema>",
        );
        assert_eq!(pairs(&flat), vec![("foo", Some("1")), ("bar", Some("2"))]);
        assert_eq!(flat.warnings, vec!["Seksjon_Group".to_string()]);
    }

    #[test]
    fn test_nested_group_inside_single_member_container() {
        // The inner table sits below a singleton container of the member.
        let flat = flatten_xml(
            "<Skjema><SkjemaData>\
                <Rad><Detaljer><d>1</d><d>2</d></Detaljer></Rad>\
                <Rad><Detaljer><d>3</d></Detaljer></Rad>\
            </SkjemaData></Skjema>",
        );
        assert!(flat.fields.is_empty());
        assert_eq!(flat.warnings, vec!["Rad".to_string()]);
    }

    #[test]
    fn test_three_levels_warn_once_for_outermost() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData>\
                <A><B><C>1</C><C>2</C></B><B><C>3</C></B></A>\
                <A><B><C>4</C></B><B><C>5</C></B></A>\
            </SkjemaData></Skjema>",
        );
        assert!(flat.fields.is_empty());
        assert_eq!(flat.warnings, vec!["A".to_string()]);
    }

    #[test]
    fn test_duplicate_names_get_occurrence_suffix() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData><A><navn>x</navn></A><B><navn>y</navn></B><C><navn>z</navn></C></SkjemaData></Skjema>",
        );
        assert_eq!(
            names(&flat),
            vec!["navn", "navn_2", "navn_3"]
        );
    }

    #[test]
    fn test_names_unique_across_tables() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData>\
                <T1><Navn>a</Navn></T1><T1><Navn>b</Navn></T1>\
                <T2><Navn>c</Navn></T2><T2><Navn>d</Navn></T2>\
            </SkjemaData></Skjema>",
        );
        let names = names(&flat);
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names, vec!["Navn_001", "Navn_002", "Navn_001_2", "Navn_002_2"]);
    }

    #[test]
    fn test_missing_data_block_flattens_root_without_metadata() {
        let flat = flatten_xml(
            "<Skjema><InternInfo><enhetsIdent>1</enhetsIdent></InternInfo><Svar><a>1</a></Svar></Skjema>",
        );
        assert_eq!(pairs(&flat), vec![("a", Some("1"))]);
    }

    #[test]
    fn test_custom_data_block() {
        let doc = load_bytes(b"<Skjema><Skjemadata><a>1</a></Skjemadata></Skjema>").unwrap();
        let engine = FlattenEngine::new(FlattenConfig::new().with_data_block("Skjemadata"));
        let flat = engine.flatten_document(&doc);
        assert_eq!(names(&flat), vec!["a"]);
    }

    #[test]
    fn test_mixed_content_text_is_not_flattened() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData><note>hello<b>x</b></note><c>1</c></SkjemaData></Skjema>",
        );
        assert_eq!(pairs(&flat), vec![("b", Some("x")), ("c", Some("1"))]);
        assert!(flat.warnings.is_empty());
    }

    #[test]
    fn test_mixed_content_in_table_member() {
        let flat = flatten_xml(
            "<Skjema><SkjemaData><Rad>a<x>1</x></Rad><Rad>b<x>2</x></Rad></SkjemaData></Skjema>",
        );
        assert_eq!(pairs(&flat), vec![("x_001", Some("1")), ("x_002", Some("2"))]);
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let xml = "<Skjema><SkjemaData><r><a>1</a></r><r><a>2</a></r><b/></SkjemaData></Skjema>";
        assert_eq!(flatten_xml(xml), flatten_xml(xml));
    }
}
