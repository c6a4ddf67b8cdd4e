//! Configuration constants and validation functions for the converter.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{AltinnError, Result};

/// Element holding the identifying metadata of a form.
pub const METADATA_BLOCK: &str = "InternInfo";

/// Element holding the survey answers.
pub const DATA_BLOCK: &str = "SkjemaData";

/// Metadata key for the entity id (`IDENT_NR`) of RA forms.
pub const ENTITY_ID_KEY: &str = "enhetsIdent";

/// Metadata key for the entity id (`IDENT_NR`) of RS forms.
pub const ENTITY_ORG_NR_KEY: &str = "enhetsOrgNr";

/// Metadata key for the entity type (`ENHETS_TYPE`).
pub const ENTITY_TYPE_KEY: &str = "enhetsType";

/// Metadata key for the sub-register number (`DELREG_NR`).
pub const SUB_REGISTER_KEY: &str = "delregNr";

/// Metadata key for the survey code. Its prefix decides the form type.
pub const RA_NUMBER_KEY: &str = "raNummer";

/// Required metadata keys of RA forms, in the order they are reported when
/// missing.
///
/// These names are a wire-format contract with Altinn and must not be renamed.
pub const RA_REQUIRED_FIELDS: [&str; 3] = [ENTITY_ID_KEY, ENTITY_TYPE_KEY, SUB_REGISTER_KEY];

/// Required metadata keys of RS forms.
pub const RS_REQUIRED_FIELDS: [&str; 3] = [ENTITY_ORG_NR_KEY, ENTITY_TYPE_KEY, SUB_REGISTER_KEY];

/// Separator between a field name and its ordinal suffix.
pub const FIELD_SEPARATOR: char = '_';

/// Zero-padded width of ordinal suffixes (`_001`).
pub const ORDINAL_WIDTH: usize = 3;

/// Placeholder `VERSION_NR` when the source carries no submitter id.
pub const DEFAULT_VERSION_NR: &str = "1";

/// `FELTNAVN` of the optional submitter row.
pub const SUBMITTER_FIELD: &str = "ANGIVER_ID";

/// Delivery timestamp in the form metadata file, converted to Oslo time.
pub const DELIVERED_AT_FIELD: &str = "ALTINNTIDSPUNKTLEVERT";

/// XML Schema instance namespace, for `xsi:nil`.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Environment variable overriding the data block name.
pub const DATA_BLOCK_ENV: &str = "ALTINN_DATA_BLOCK";

/// Environment variable overriding the metadata block name.
pub const METADATA_BLOCK_ENV: &str = "ALTINN_METADATA_BLOCK";

/// XML local name: letter or underscore, then letters, digits, `.`, `-`, `_`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAG_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._\-]*$").expect("valid regex"));

/// Altinn form file name: `form_<submitter id>.xml`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FORM_FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^form_([0-9A-Za-z]+)\.xml$").expect("valid regex"));

/// Validate that a block name is a usable XML element name.
///
/// # Examples
/// ```
/// use altinn_isee::config::validate_tag_name;
///
/// assert!(validate_tag_name("SkjemaData").is_ok());
/// assert!(validate_tag_name("1abc").is_err());
/// ```
pub fn validate_tag_name(tag: &str) -> Result<()> {
    if TAG_NAME_PATTERN.is_match(tag) {
        Ok(())
    } else {
        Err(AltinnError::Config(format!(
            "'{tag}' is not a valid XML element name"
        )))
    }
}

/// Extract the submitter (angiver) id from an Altinn form path.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use altinn_isee::config::extract_submitter_id;
///
/// let path = Path::new("/data/2025/1/8/form_006149bef144.xml");
/// assert_eq!(extract_submitter_id(path).as_deref(), Some("006149bef144"));
/// assert_eq!(extract_submitter_id(Path::new("other.xml")), None);
/// ```
pub fn extract_submitter_id(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    FORM_FILE_PATTERN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Path of the metadata file Altinn delivers next to a form.
///
/// `form_<id>.xml` is accompanied by `meta_<id>.json` in the same directory.
///
/// # Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use altinn_isee::config::meta_sidecar_path;
///
/// assert_eq!(
///     meta_sidecar_path(Path::new("/data/form_006149bef144.xml")),
///     Some(PathBuf::from("/data/meta_006149bef144.json"))
/// );
/// assert_eq!(meta_sidecar_path(Path::new("/data/skjema.xml")), None);
/// ```
pub fn meta_sidecar_path(path: &Path) -> Option<PathBuf> {
    let id = extract_submitter_id(path)?;
    Some(path.with_file_name(format!("meta_{id}.json")))
}

/// Format the ordinal suffix for the `n`-th member of a repeated group.
///
/// # Examples
/// ```
/// use altinn_isee::config::ordinal_suffix;
///
/// assert_eq!(ordinal_suffix(1), "_001");
/// assert_eq!(ordinal_suffix(1234), "_1234");
/// ```
pub fn ordinal_suffix(n: usize) -> String {
    format!("{FIELD_SEPARATOR}{n:0width$}", width = ORDINAL_WIDTH)
}

/// Names of the structural blocks the engine looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    pub data_block: String,
    pub metadata_block: String,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            data_block: DATA_BLOCK.to_string(),
            metadata_block: METADATA_BLOCK.to_string(),
        }
    }
}

impl FlattenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read block names from the environment, falling back to the Altinn3 defaults.
    pub fn from_env() -> Result<Self> {
        let data_block = std::env::var(DATA_BLOCK_ENV).unwrap_or_else(|_| DATA_BLOCK.into());
        let metadata_block =
            std::env::var(METADATA_BLOCK_ENV).unwrap_or_else(|_| METADATA_BLOCK.into());

        validate_tag_name(&data_block)?;
        validate_tag_name(&metadata_block)?;

        Ok(Self {
            data_block,
            metadata_block,
        })
    }

    pub fn with_data_block(mut self, tag: impl Into<String>) -> Self {
        self.data_block = tag.into();
        self
    }

    pub fn with_metadata_block(mut self, tag: impl Into<String>) -> Self {
        self.metadata_block = tag.into();
        self
    }

    /// Check that both block names are valid element names.
    pub fn validate(&self) -> Result<()> {
        validate_tag_name(&self.data_block)?;
        validate_tag_name(&self.metadata_block)
    }
}
