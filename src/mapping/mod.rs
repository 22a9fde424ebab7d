//! Field Mapping Module
//!
//! Template types plus the pieces that turn a record into fill values:
//! - key normalization for descriptors returned by field discovery
//! - replacement rules (`original|replacement` per line)
//! - the mapping builder

mod builder;
mod normalize;
mod replacements;
mod types;

pub use builder::{image_payload, MappingBuilder};
pub use normalize::{normalize_keys, pdftk_field_keys};
pub use replacements::{transform_string, ReplacementRules};
pub use types::*;
