//! Altinn ISEE - Flatten Altinn3 survey XML into ISEE/Dynarev rows.
//!
//! This crate converts submitted Altinn3 forms into the long row format
//! loaded into ISEE/Dynarev: one row per answered field, tagged with the
//! form's identifying metadata from the `InternInfo` block.
//!
//! # Example
//!
//! ```
//! use altinn_isee::{convert_bytes, ConvertOptions, SourceContext};
//!
//! let xml = br#"<Skjema>
//!   <InternInfo><enhetsIdent>123</enhetsIdent><enhetsType>A</enhetsType><delregNr>9</delregNr></InternInfo>
//!   <SkjemaData><foo>1</foo><Rad><x>a</x></Rad><Rad><x>b</x></Rad></SkjemaData>
//! </Skjema>"#;
//!
//! let conversion = convert_bytes(xml, &SourceContext::new("form_1"), &ConvertOptions::default()).unwrap();
//! let names: Vec<_> = conversion.rows.iter().map(|r| r.field_name.as_str()).collect();
//! assert_eq!(names, ["foo", "x_001", "x_002"]);
//! ```
//!
//! # Architecture
//!
//! - [`tree`]: XML loading and normalization into an ordered tree
//! - [`flatten`]: Flattening engine (fields, ordinals, table-in-table warnings)
//! - [`assemble`]: Metadata extraction and row assembly
//! - [`mapping`]: Field-name remapping
//! - [`checkbox`]: Checkbox answer expansion
//! - [`meta`]: Form metadata files (`meta_<id>.json`)
//! - [`output`]: CSV output and ISEE file naming
//! - [`converter`]: Per-document pipeline
//! - [`config`]: Constants, block names and validation
//! - [`types`]: Core data types (Row, MetadataBlock, SourceContext)
//! - [`error`]: Error types and Result alias
//! - [`xml`]: XML utilities
//! - [`cli`]: Command-line interface

pub mod assemble;
pub mod checkbox;
pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod flatten;
pub mod mapping;
pub mod meta;
pub mod output;
pub mod tree;
pub mod types;
pub mod xml;

// Re-export main functions
pub use converter::{convert_bytes, convert_bytes_with_meta, convert_file, ConvertOptions};

// Re-export commonly used items
pub use error::{AltinnError, Result};
pub use flatten::{FlatField, FlattenEngine, Flattened};
pub use types::{Conversion, FormType, MetadataBlock, Row, SourceContext};
