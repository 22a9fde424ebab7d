//! Field mapping builder
//!
//! Turns a template's field definitions and a record's values into the
//! text and image mappings sent to a fill backend.

use std::sync::Arc;

use base64::Engine;

use super::replacements::{transform_string, ReplacementRules};
use super::types::{FieldDefinition, FieldMapping, FormTemplate, ImagePayload, IMAGE_MARKER};
use crate::record::Record;
use crate::storage::{parse_file_id, path_info, FileStore};
use crate::token;

pub struct MappingBuilder {
    files: Arc<dyn FileStore>,
}

impl MappingBuilder {
    pub fn new(files: Arc<dyn FileStore>) -> Self {
        Self { files }
    }

    /// Build the mapping for `template` from `record`'s values.
    ///
    /// Image fields whose file cannot be loaded are left out.
    pub async fn build(&self, template: &FormTemplate, record: &Record) -> FieldMapping {
        let form_rules = ReplacementRules::parse(&template.replacements);
        let mut mapping = FieldMapping::new();

        for field in &template.fields {
            let image_element = record
                .image_elements()
                .find(|element| field.value == token::value_token(&element.key));

            match image_element {
                Some(element) => {
                    self.map_image(field, &element.key, record, &mut mapping)
                        .await;
                }
                None => {
                    let value = map_text(field, record, &form_rules);
                    mapping.fields.insert(field.pdf_key.clone(), value);
                }
            }
        }

        tracing::debug!(
            fid = template.fid,
            sid = record.sid,
            fields = mapping.fields.len(),
            images = mapping.images.len(),
            "Built field mapping"
        );

        mapping
    }

    async fn map_image(
        &self,
        field: &FieldDefinition,
        element_key: &str,
        record: &Record,
        mapping: &mut FieldMapping,
    ) {
        let Some(file_id) = record.element_data(element_key).and_then(parse_file_id) else {
            tracing::debug!(pdf_key = %field.pdf_key, "No image file on record, skipping field");
            return;
        };

        let file = match self.files.load(file_id).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                tracing::debug!(pdf_key = %field.pdf_key, file_id = file_id, "Image file not found, skipping field");
                return;
            }
            Err(e) => {
                tracing::warn!(pdf_key = %field.pdf_key, file_id = file_id, "Failed to load image file: {}", e);
                return;
            }
        };

        let data = match self.files.read(&file.uri).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(pdf_key = %field.pdf_key, uri = %file.uri, "Failed to read image file: {}", e);
                return;
            }
        };

        mapping
            .fields
            .insert(field.pdf_key.clone(), format!("{}{}", IMAGE_MARKER, file.uri));

        if !data.is_empty() {
            mapping
                .images
                .insert(field.pdf_key.clone(), image_payload(&file.uri, &data));
        }
    }
}

/// Resolve, clean up and decorate a text field's value
fn map_text(field: &FieldDefinition, record: &Record, form_rules: &ReplacementRules) -> String {
    let resolved = token::resolve(&field.value, record).replace("<br />", "\n");

    let field_rules = ReplacementRules::parse(&field.replacements);
    let mut value = transform_string(&resolved, form_rules, &field_rules);

    if !value.is_empty() {
        value = format!("{}{}{}", field.prefix, value, field.suffix);
    }

    value
}

/// Payload for an image, with the filename replaced by a hash
pub fn image_payload(uri: &str, data: &[u8]) -> ImagePayload {
    let (stem, extension) = path_info(uri);

    ImagePayload {
        data: base64::engine::general_purpose::STANDARD.encode(data),
        filenamehash: format!("{:x}.{}", md5::compute(stem.as_bytes()), extension),
    }
}
