//! Core data types for the converter.
//!
//! These types describe one Altinn form on its way to the ISEE/Dynarev
//! row format.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{
    extract_submitter_id, DEFAULT_VERSION_NR, ENTITY_ID_KEY, ENTITY_ORG_NR_KEY,
    RA_REQUIRED_FIELDS, RS_REQUIRED_FIELDS,
};
use crate::error::{AltinnError, Result};

/// Kind of Altinn form, given by the prefix of its `raNummer`.
///
/// RA forms identify the reporting entity by `enhetsIdent`, RS forms by the
/// organisation number in `enhetsOrgNr`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormType {
    #[default]
    Ra,
    Rs,
}

impl FormType {
    /// Decide the form type from a `raNummer`.
    ///
    /// Forms without a `raNummer` are treated as RA forms.
    ///
    /// # Examples
    /// ```
    /// use altinn_isee::types::FormType;
    ///
    /// assert_eq!(FormType::from_ra_number(Some("RA-0297")).unwrap(), FormType::Ra);
    /// assert_eq!(FormType::from_ra_number(Some("rs0345")).unwrap(), FormType::Rs);
    /// assert_eq!(FormType::from_ra_number(None).unwrap(), FormType::Ra);
    /// assert!(FormType::from_ra_number(Some("0297")).is_err());
    /// ```
    pub fn from_ra_number(ra_number: Option<&str>) -> Result<Self> {
        let Some(ra_number) = ra_number else {
            return Ok(Self::Ra);
        };

        let prefix: String = ra_number.trim().chars().take(2).collect();
        match prefix.to_ascii_uppercase().as_str() {
            "RA" => Ok(Self::Ra),
            "RS" => Ok(Self::Rs),
            _ => Err(AltinnError::InvalidFormType(ra_number.to_string())),
        }
    }

    /// `InternInfo` key holding the entity id.
    pub fn entity_id_key(self) -> &'static str {
        match self {
            Self::Ra => ENTITY_ID_KEY,
            Self::Rs => ENTITY_ORG_NR_KEY,
        }
    }

    /// Required `InternInfo` keys, in reporting order.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Ra => &RA_REQUIRED_FIELDS,
            Self::Rs => &RS_REQUIRED_FIELDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ra => "RA",
            Self::Rs => "RS",
        }
    }
}

/// Identifying metadata from the `InternInfo` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    pub form_type: FormType,

    /// `enhetsIdent` for RA forms, `enhetsOrgNr` for RS forms.
    pub entity_id: String,

    /// `enhetsType`.
    pub entity_type: String,

    /// `delregNr`.
    pub sub_register_number: String,

    /// `raNummer`, when present.
    pub ra_number: Option<String>,
}

/// Identifiers of the source document that are constant across its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    /// `SKJEMA_ID`.
    pub form_id: String,

    /// `VERSION_NR`.
    pub version_number: String,
}

impl SourceContext {
    /// Create a context with the placeholder version number.
    #[must_use]
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            version_number: DEFAULT_VERSION_NR.to_string(),
        }
    }

    /// Set the version number.
    #[must_use]
    pub fn with_version(mut self, version_number: impl Into<String>) -> Self {
        self.version_number = version_number.into();
        self
    }

    /// Derive the context from a file path.
    ///
    /// The form id is the file name without extension. The version number is
    /// the submitter id of a `form_<id>.xml` file, or the placeholder.
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    /// use altinn_isee::types::SourceContext;
    ///
    /// let ctx = SourceContext::from_path(Path::new("/in/form_a9b867d4a91c.xml"));
    /// assert_eq!(ctx.form_id, "form_a9b867d4a91c");
    /// assert_eq!(ctx.version_number, "a9b867d4a91c");
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let form_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let context = Self::new(form_id);
        match extract_submitter_id(path) {
            Some(id) => context.with_version(id),
            None => context,
        }
    }
}

/// One output record in ISEE/Dynarev format.
///
/// Serialized field names are the column contract with the load target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "SKJEMA_ID")]
    pub form_id: String,

    #[serde(rename = "DELREG_NR")]
    pub sub_register_number: String,

    #[serde(rename = "IDENT_NR")]
    pub entity_id: String,

    #[serde(rename = "ENHETS_TYPE")]
    pub entity_type: String,

    #[serde(rename = "FELTNAVN")]
    pub field_name: String,

    #[serde(rename = "FELTVERDI")]
    pub field_value: Option<String>,

    #[serde(rename = "VERSION_NR")]
    pub version_number: String,

    /// Nesting level of the field, only set when levels are requested.
    #[serde(rename = "LEVEL", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
}

/// A successfully assembled form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Output rows, one per flattened field.
    pub rows: Vec<Row>,

    /// Qualified paths of structures that could not be flattened.
    pub warnings: Vec<String>,

    /// Metadata the rows were tagged with.
    pub metadata: MetadataBlock,
}
