//! XML helpers on top of `roxmltree`.

mod utils;

pub use utils::{attribute_pairs, element_children, get_tag_name, get_text, is_nil};
