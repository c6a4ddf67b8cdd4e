//! Row assembly: tags flattened fields with the form's identifying metadata.

use crate::config::{ENTITY_TYPE_KEY, RA_NUMBER_KEY, SUBMITTER_FIELD, SUB_REGISTER_KEY};
use crate::error::{AltinnError, Result};
use crate::flatten::FlatField;
use crate::tree::NormalizedNode;
use crate::types::{FormType, MetadataBlock, Row, SourceContext};

/// Options for row assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Append an `ANGIVER_ID` row carrying the version number.
    pub submitter_row: bool,

    /// Fill the `LEVEL` column with each field's nesting depth.
    pub include_level: bool,
}

/// Extract the required metadata from the `InternInfo` block.
///
/// The form type comes from the `raNummer` prefix and decides which keys are
/// required: `enhetsIdent` for RA forms, `enhetsOrgNr` for RS forms, plus
/// `enhetsType` and `delregNr` for both. Every required key that is missing
/// or empty is collected, so the error lists all problems at once. A missing
/// block reports all required keys of an RA form.
///
/// # Examples
/// ```
/// use altinn_isee::assemble::extract_metadata;
/// use altinn_isee::tree::NormalizedNode;
///
/// let block = NormalizedNode::new("InternInfo")
///     .with_child(NormalizedNode::leaf("enhetsIdent", "123"));
/// let err = extract_metadata(Some(&block)).unwrap_err();
/// assert!(err.to_string().contains("enhetsType, delregNr"));
/// ```
pub fn extract_metadata(block: Option<&NormalizedNode>) -> Result<MetadataBlock> {
    let lookup = |key: &str| -> Option<String> {
        block
            .and_then(|b| b.first_child(key))
            .and_then(|node| node.text.clone())
            .filter(|value| !value.is_empty())
    };

    let ra_number = lookup(RA_NUMBER_KEY);
    let form_type = FormType::from_ra_number(ra_number.as_deref())?;

    let missing: Vec<String> = form_type
        .required_fields()
        .iter()
        .filter(|key| lookup(**key).is_none())
        .map(|key| (*key).to_string())
        .collect();

    if !missing.is_empty() {
        return Err(AltinnError::MissingRequiredField { fields: missing });
    }

    tracing::debug!(form_type = form_type.as_str(), "Extracted metadata");

    Ok(MetadataBlock {
        form_type,
        entity_id: lookup(form_type.entity_id_key()).unwrap_or_default(),
        entity_type: lookup(ENTITY_TYPE_KEY).unwrap_or_default(),
        sub_register_number: lookup(SUB_REGISTER_KEY).unwrap_or_default(),
        ra_number,
    })
}

/// Build one row per field, in field order.
pub fn assemble(
    metadata: &MetadataBlock,
    fields: &[FlatField],
    source: &SourceContext,
    options: AssembleOptions,
) -> Vec<Row> {
    let row = |field_name: String, field_value: Option<String>, depth: usize| Row {
        form_id: source.form_id.clone(),
        sub_register_number: metadata.sub_register_number.clone(),
        entity_id: metadata.entity_id.clone(),
        entity_type: metadata.entity_type.clone(),
        field_name,
        field_value,
        version_number: source.version_number.clone(),
        level: options.include_level.then_some(depth),
    };

    let mut rows: Vec<Row> = fields
        .iter()
        .map(|field| row(field.name.clone(), field.value.clone(), field.depth))
        .collect();

    if options.submitter_row {
        rows.push(row(
            SUBMITTER_FIELD.to_string(),
            Some(source.version_number.clone()),
            0,
        ));
    }

    rows
}
