//! XML invoice reader: control-character sanitizing, a small element tree
//! and the typed schema paths used by the extractor.

mod document;
mod fields;

pub use document::{Document, Element, sanitize};
pub use fields::*;
