//! Field-name remapping from old (Altinn2) names to the names used in ISEE.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{AltinnError, Result};
use crate::types::Row;

/// Dictionary of `FELTNAVN` substitutions.
///
/// Names without an entry pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    names: HashMap<String, String>,
}

impl FieldMapping {
    /// Create an empty (identity) mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(original, replacement)` pairs.
    ///
    /// # Examples
    /// ```
    /// use altinn_isee::mapping::FieldMapping;
    ///
    /// let mapping = FieldMapping::from_pairs([("AntAnsatt", "ANSATTE")]);
    /// assert_eq!(mapping.rename("AntAnsatt"), "ANSATTE");
    /// assert_eq!(mapping.rename("Omsetning"), "Omsetning");
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a mapping file: a YAML (or JSON) object of name to name.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let names: HashMap<String, String> =
            serde_yaml_ng::from_str(&content).map_err(|source| AltinnError::Mapping {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %path.display(), entries = names.len(), "Loaded field mapping");
        Ok(Self { names })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The replacement for `name`, or `name` itself.
    pub fn rename<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Rename `field_name` of every row in place.
    ///
    /// Row count, order and all other columns are left untouched.
    pub fn apply(&self, rows: &mut [Row]) {
        if self.names.is_empty() {
            return;
        }
        for row in rows.iter_mut() {
            if let Some(new_name) = self.names.get(&row.field_name) {
                row.field_name.clone_from(new_name);
            }
        }
    }
}
