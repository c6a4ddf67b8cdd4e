//! Form metadata delivered by Altinn next to each form.
//!
//! Altinn writes `meta_<id>.json` beside `form_<id>.xml`. Its entries can be
//! attached to the form's rows as extra fields: keys are upper-cased and the
//! delivery timestamp is converted from UTC to Norwegian local time.

use std::fs;
use std::path::Path;

use chrono::DateTime;
use chrono_tz::Europe::Oslo;
use indexmap::IndexMap;
use serde_json::Value;

use crate::config::DELIVERED_AT_FIELD;
use crate::error::{AltinnError, Result};
use crate::flatten::FlatField;

/// Convert an RFC 3339 timestamp to Europe/Oslo time.
///
/// The result has second precision and an explicit UTC offset.
///
/// # Examples
/// ```
/// use altinn_isee::meta::convert_to_oslo_time;
///
/// assert_eq!(
///     convert_to_oslo_time("2023-05-01T12:00:00Z").unwrap(),
///     "2023-05-01T14:00:00+02:00"
/// );
/// ```
pub fn convert_to_oslo_time(timestamp: &str) -> Result<String> {
    let parsed =
        DateTime::parse_from_rfc3339(timestamp.trim()).map_err(|source| AltinnError::Timestamp {
            value: timestamp.to_string(),
            source,
        })?;

    Ok(parsed
        .with_timezone(&Oslo)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string())
}

/// Turn metadata entries into fields, in file order.
///
/// Names are upper-cased. Strings are kept as they are, `null` becomes a
/// missing value and other JSON values are written in their JSON form.
pub fn meta_fields(entries: &IndexMap<String, Value>) -> Result<Vec<FlatField>> {
    entries
        .iter()
        .map(|(key, value)| -> Result<FlatField> {
            let name = key.to_uppercase();
            let value = match value {
                Value::Null => None,
                Value::String(text) if name == DELIVERED_AT_FIELD => {
                    Some(convert_to_oslo_time(text)?)
                }
                Value::String(text) => Some(text.clone()),
                other => Some(other.to_string()),
            };
            Ok(FlatField::new(name, value, 0))
        })
        .collect()
}

/// Parse a metadata document into fields.
pub fn parse_meta(json: &str, origin: &str) -> Result<Vec<FlatField>> {
    let entries: IndexMap<String, Value> =
        serde_json::from_str(json).map_err(|source| AltinnError::Metadata {
            path: origin.to_string(),
            source,
        })?;
    meta_fields(&entries)
}

/// Load the metadata file at `path`.
///
/// A missing file yields no fields.
pub fn load_meta(path: &Path) -> Result<Vec<FlatField>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No form metadata file");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    let fields = parse_meta(&content, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), fields = fields.len(), "Loaded form metadata");
    Ok(fields)
}
