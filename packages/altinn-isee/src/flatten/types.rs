//! Types produced by the flattening engine.

use serde::Serialize;

/// One field of the flattened form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatField {
    /// Field name, suffixed with an ordinal inside tables (`Areal_001`).
    pub name: String,

    /// Text of the element, `None` for empty or nil elements.
    pub value: Option<String>,

    /// Nesting level below the data block (0 = direct child).
    pub depth: usize,
}

impl FlatField {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            value,
            depth,
        }
    }
}

/// Output of one flattening pass.
///
/// `warnings` names structures the engine could not flatten. They are
/// informational: the fields that could be flattened are still present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flattened {
    pub fields: Vec<FlatField>,
    pub warnings: Vec<String>,
}
