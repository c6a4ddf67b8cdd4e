//! Main conversion pipeline that ties all components together.

use std::fs;
use std::path::Path;

use crate::assemble::{assemble, extract_metadata, AssembleOptions};
use crate::checkbox::expand_checkboxes;
use crate::config::{meta_sidecar_path, FlattenConfig};
use crate::error::Result;
use crate::flatten::{FlatField, FlattenEngine};
use crate::mapping::FieldMapping;
use crate::meta::load_meta;
use crate::tree::load_bytes;
use crate::types::{Conversion, SourceContext};

/// Options controlling one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Block names.
    pub config: FlattenConfig,

    /// Field-name remapping applied after flattening.
    pub mapping: Option<FieldMapping>,

    /// Fields holding comma-separated checkbox answers.
    pub checkbox_fields: Vec<String>,

    /// Name expanded checkbox rows by option code only.
    pub unique_code: bool,

    /// Attach the entries of the form's `meta_<id>.json` as extra fields.
    pub attach_meta: bool,

    pub assemble: AssembleOptions,
}

/// Convert one Altinn form to ISEE rows.
///
/// All-or-nothing: a malformed document or missing metadata returns an error
/// and no rows. Tables within tables are reported in
/// [`Conversion::warnings`] and do not fail the conversion.
///
/// # Examples
/// ```
/// use altinn_isee::converter::{convert_bytes, ConvertOptions};
/// use altinn_isee::types::SourceContext;
///
/// let xml = br#"<Skjema>
///   <InternInfo><enhetsIdent>123</enhetsIdent><enhetsType>A</enhetsType><delregNr>9</delregNr></InternInfo>
///   <SkjemaData><foo>1</foo><bar>2</bar></SkjemaData>
/// </Skjema>"#;
///
/// let result = convert_bytes(xml, &SourceContext::new("form_1"), &ConvertOptions::default()).unwrap();
/// assert_eq!(result.rows.len(), 2);
/// assert_eq!(result.rows[0].field_name, "foo");
/// assert!(result.warnings.is_empty());
/// ```
pub fn convert_bytes(
    bytes: &[u8],
    source: &SourceContext,
    options: &ConvertOptions,
) -> Result<Conversion> {
    convert_bytes_with_meta(bytes, source, &[], options)
}

/// Convert one form and append `meta` after its own fields.
///
/// `meta` is typically the output of [`load_meta`](crate::meta::load_meta).
/// The extra fields get rows like any other field and go through remapping.
pub fn convert_bytes_with_meta(
    bytes: &[u8],
    source: &SourceContext,
    meta: &[FlatField],
    options: &ConvertOptions,
) -> Result<Conversion> {
    let doc = load_bytes(bytes)?;

    let flattened = FlattenEngine::new(options.config.clone()).flatten_document(&doc);

    let metadata = extract_metadata(doc.block(&options.config.metadata_block))?;
    drop(doc);

    let mut fields = flattened.fields;
    fields.extend_from_slice(meta);
    let mut rows = assemble(&metadata, &fields, source, options.assemble);

    if let Some(mapping) = &options.mapping {
        mapping.apply(&mut rows);
    }

    for field in &options.checkbox_fields {
        rows = expand_checkboxes(rows, field, options.unique_code);
    }

    tracing::debug!(
        form_id = %source.form_id,
        rows = rows.len(),
        warnings = flattened.warnings.len(),
        "Converted form"
    );

    Ok(Conversion {
        rows,
        warnings: flattened.warnings,
        metadata,
    })
}

/// Convert an Altinn form file.
///
/// The form id and version number are derived from the file name, see
/// [`SourceContext::from_path`]. With [`ConvertOptions::attach_meta`] the
/// metadata file next to the form is read too, when there is one.
pub fn convert_file(path: &Path, options: &ConvertOptions) -> Result<Conversion> {
    let bytes = fs::read(path)?;
    let source = SourceContext::from_path(path);

    let meta = match meta_sidecar_path(path) {
        Some(meta_path) if options.attach_meta => load_meta(&meta_path)?,
        _ => Vec::new(),
    };

    convert_bytes_with_meta(&bytes, &source, &meta, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AltinnError;
    use pretty_assertions::assert_eq;

    const FORM: &str = r#"<Skjema>
        <InternInfo>
            <enhetsIdent>123</enhetsIdent>
            <enhetsType>A</enhetsType>
            <delregNr>9</delregNr>
        </InternInfo>
        <SkjemaData>
            <foo>1</foo>
            <bar>2</bar>
            <Vekst>bygg,havre</Vekst>
        </SkjemaData>
    </Skjema>"#;

    #[test]
    fn test_convert_with_mapping_and_checkbox() {
        let options = ConvertOptions {
            mapping: Some(FieldMapping::from_pairs([("foo", "FOO")])),
            checkbox_fields: vec!["Vekst".to_string()],
            ..ConvertOptions::default()
        };
        let result = convert_bytes(FORM.as_bytes(), &SourceContext::new("f"), &options).unwrap();

        let names: Vec<_> = result.rows.iter().map(|r| r.field_name.as_str()).collect();
        assert_eq!(names, vec!["FOO", "bar", "Vekstbygg", "Veksthavre"]);
    }

    #[test]
    fn test_missing_metadata_rejects_document() {
        let xml = b"<Skjema><InternInfo><enhetsType>A</enhetsType></InternInfo><SkjemaData><a>1</a></SkjemaData></Skjema>";
        let err = convert_bytes(xml, &SourceContext::new("f"), &ConvertOptions::default())
            .unwrap_err();
        match err {
            AltinnError::MissingRequiredField { fields } => {
                assert_eq!(fields, vec!["enhetsIdent".to_string(), "delregNr".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_document_rejected() {
        let err = convert_bytes(b"<Skjema>", &SourceContext::new("f"), &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, AltinnError::MalformedDocument(_)));
    }

    #[test]
    fn test_convert_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form_abc123.xml");
        fs::write(&path, FORM).unwrap();

        let result = convert_file(&path, &ConvertOptions::default()).unwrap();
        assert!(result
            .rows
            .iter()
            .all(|r| r.form_id == "form_abc123" && r.version_number == "abc123"));
    }

    #[test]
    fn test_convert_file_attaches_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form_abc123.xml");
        fs::write(&path, FORM).unwrap();
        fs::write(
            dir.path().join("meta_abc123.json"),
            r#"{"altinnTidspunktLevert": "2023-05-01T12:00:00Z"}"#,
        )
        .unwrap();

        let plain = convert_file(&path, &ConvertOptions::default()).unwrap();
        assert_eq!(plain.rows.len(), 3);

        let options = ConvertOptions {
            attach_meta: true,
            ..ConvertOptions::default()
        };
        let result = convert_file(&path, &options).unwrap();
        let last = result.rows.last().unwrap();
        assert_eq!(result.rows.len(), 4);
        assert_eq!(last.field_name, "ALTINNTIDSPUNKTLEVERT");
        assert_eq!(last.field_value.as_deref(), Some("2023-05-01T14:00:00+02:00"));
        assert_eq!(last.entity_id, "123");
    }

    #[test]
    fn test_convert_file_without_meta_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form_abc123.xml");
        fs::write(&path, FORM).unwrap();

        let options = ConvertOptions {
            attach_meta: true,
            ..ConvertOptions::default()
        };
        assert_eq!(convert_file(&path, &options).unwrap().rows.len(), 3);
    }

    #[test]
    fn test_convert_with_level() {
        let xml = b"<Skjema><InternInfo><enhetsIdent>1</enhetsIdent><enhetsType>A</enhetsType><delregNr>9</delregNr></InternInfo>\
            <SkjemaData><a>1</a><Del><b>2</b></Del><r><c>x</c></r><r><c>y</c></r></SkjemaData></Skjema>";
        let options = ConvertOptions {
            assemble: AssembleOptions {
                include_level: true,
                ..AssembleOptions::default()
            },
            ..ConvertOptions::default()
        };
        let result = convert_bytes(xml, &SourceContext::new("f"), &options).unwrap();

        let levels: Vec<_> = result
            .rows
            .iter()
            .map(|r| (r.field_name.as_str(), r.level))
            .collect();
        assert_eq!(
            levels,
            vec![("a", Some(0)), ("b", Some(1)), ("c_001", Some(1)), ("c_002", Some(1))]
        );
    }

    #[test]
    fn test_convert_missing_file() {
        let err = convert_file(Path::new("/nonexistent/form_x.xml"), &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, AltinnError::Io(_)));
    }
}
