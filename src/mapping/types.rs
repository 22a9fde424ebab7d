//! Template and mapping types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix marking a mapped value as an image reference
pub const IMAGE_MARKER: &str = "{image}";

/// A configured PDF form definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub fid: u64,
    /// Stable identifier; per-form backend settings are keyed by it
    pub uuid: Uuid,
    #[serde(default)]
    pub admin_title: String,
    /// Title pattern used to derive the output filename
    #[serde(default)]
    pub title: String,
    /// URI of the PDF the template fills
    pub pdf_uri: String,
    /// Form-level replacement rules, `original|replacement` per line
    #[serde(default)]
    pub replacements: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Mapping of one PDF field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub pdf_key: String,
    /// Literal text and/or reference tokens
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    /// Field-level replacement rules
    #[serde(default)]
    pub replacements: String,
}

impl FieldDefinition {
    pub fn new(pdf_key: &str, value: &str) -> Self {
        Self {
            pdf_key: pdf_key.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }
}

/// Image data sent alongside the field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Base64 of the image bytes
    pub data: String,
    /// `md5(basename) + "." + extension`
    pub filenamehash: String,
}

/// Values for one fill operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub fields: IndexMap<String, String>,
    pub images: IndexMap<String, ImagePayload>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path behind an `{image}` marker, if the field holds one
    pub fn image_uri(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.strip_prefix(IMAGE_MARKER))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Per-call fill parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillContext {
    /// Id of the triggering record
    pub entity_id: u64,
    pub fid: u64,
    pub flatten: bool,
    pub filename: String,
    pub sample: bool,
    pub force_download: bool,
}

impl FillContext {
    pub fn new(entity_id: u64, fid: u64) -> Self {
        Self {
            entity_id,
            fid,
            flatten: true,
            filename: String::new(),
            sample: false,
            force_download: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_uri() {
        let mut mapping = FieldMapping::new();
        mapping
            .fields
            .insert("sig".to_string(), "{image}public://up/sig.png".to_string());
        mapping.fields.insert("name".to_string(), "Ada".to_string());

        assert_eq!(mapping.image_uri("sig"), Some("public://up/sig.png"));
        assert_eq!(mapping.image_uri("name"), None);
        assert_eq!(mapping.image_uri("missing"), None);
    }
}
