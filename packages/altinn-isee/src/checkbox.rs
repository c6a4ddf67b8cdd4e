//! Expansion of multi-choice (checkbox) answers.
//!
//! Altinn stores the options ticked in a checkbox group as one comma-separated
//! value. ISEE expects one field per ticked option with the value `1`.

use crate::types::Row;

/// Value written for each ticked option.
const CHECKED: &str = "1";

/// Replace each row named `field` by one row per ticked option.
///
/// The new rows are named `<field><option>`, or just `<option>` when
/// `unique_code` is set (the option codes are already unique field names).
/// They take the place of the original row. Rows for other fields, and rows
/// for `field` with an empty value, are left unchanged.
///
/// # Examples
/// ```
/// use altinn_isee::checkbox::expand_checkboxes;
/// use altinn_isee::types::Row;
///
/// let row = Row {
///     form_id: "RA0297".into(),
///     sub_register_number: "9".into(),
///     entity_id: "123".into(),
///     entity_type: "A".into(),
///     field_name: "Vekst".into(),
///     field_value: Some("bygg,havre".into()),
///     version_number: "1".into(),
///     level: None,
/// };
/// let rows = expand_checkboxes(vec![row], "Vekst", false);
/// let names: Vec<_> = rows.iter().map(|r| r.field_name.as_str()).collect();
/// assert_eq!(names, ["Vekstbygg", "Veksthavre"]);
/// ```
pub fn expand_checkboxes(rows: Vec<Row>, field: &str, unique_code: bool) -> Vec<Row> {
    let mut expanded = Vec::with_capacity(rows.len());

    for row in rows {
        let options: Vec<String> = match (&row.field_value, row.field_name == field) {
            (Some(value), true) => value
                .split(',')
                .map(str::trim)
                .filter(|option| !option.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        if options.is_empty() {
            expanded.push(row);
            continue;
        }

        tracing::debug!(field = %field, options = options.len(), "Expanding checkbox answer");
        for option in options {
            let field_name = if unique_code {
                option
            } else {
                format!("{field}{option}")
            };
            expanded.push(Row {
                field_name,
                field_value: Some(CHECKED.to_string()),
                ..row.clone()
            });
        }
    }

    expanded
}
