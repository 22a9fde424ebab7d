//! Field descriptor key normalization

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Rename the keys of a raw field descriptor.
///
/// Keys present in `keymap` are renamed to the mapped name. Other keys are
/// kept unless `drop_unmapped` is set.
pub fn normalize_keys(
    raw: Map<String, Value>,
    keymap: &HashMap<String, String>,
    drop_unmapped: bool,
) -> Map<String, Value> {
    let mut normalized = Map::new();

    for (key, value) in raw {
        if let Some(renamed) = keymap.get(&key) {
            normalized.insert(renamed.clone(), value);
        } else if !drop_unmapped {
            normalized.insert(key, value);
        }
    }

    normalized
}

/// Keymap for descriptors returned by the PDFtk service
pub fn pdftk_field_keys() -> HashMap<String, String> {
    HashMap::from([("pdf_name".to_string(), "name".to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_renames_mapped_keys() {
        let out = normalize_keys(
            raw(json!({ "pdf_name": "first_name", "type": "Text" })),
            &pdftk_field_keys(),
            false,
        );

        assert!(!out.contains_key("pdf_name"));
        assert_eq!(out.get("name"), Some(&json!("first_name")));
        assert_eq!(out.get("type"), Some(&json!("Text")));
    }

    #[test]
    fn test_drop_unmapped() {
        let out = normalize_keys(
            raw(json!({ "pdf_name": "first_name", "type": "Text", "flags": 0 })),
            &pdftk_field_keys(),
            true,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out.get("name"), Some(&json!("first_name")));
    }

    #[test]
    fn test_empty_keymap_is_identity() {
        let input = raw(json!({ "a": 1, "b": [1, 2] }));
        let out = normalize_keys(input.clone(), &HashMap::new(), false);
        assert_eq!(out, input);
    }
}
