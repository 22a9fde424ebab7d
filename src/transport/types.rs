//! Wire types for the PDFtk fill service

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw field descriptor as returned by `fields.json`
pub type RawFieldDescriptor = Map<String, Value>;

/// A fillable field discovered in a PDF, after key normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Anything else the service reports (flags, options, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Flat request: one query parameter per field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleFillRequest {
    /// Externally reachable URL of the template PDF
    pub pdf: String,
    pub flatten: bool,
    pub fields: IndexMap<String, String>,
}

impl SimpleFillRequest {
    /// Query pairs in wire order: `pdf`, `flatten` (only when set), fields.
    /// Fields named like the reserved parameters are dropped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("pdf".to_string(), self.pdf.clone())];
        if self.flatten {
            pairs.push(("flatten".to_string(), "1".to_string()));
        }

        for (key, value) in &self.fields {
            if key == "pdf" || key == "flatten" {
                continue;
            }
            pairs.push((key.clone(), value.clone()));
        }

        pairs
    }
}

/// Typed field record for complex requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApiField {
    Text {
        data: String,
    },
    Image {
        /// Base64 of the image bytes
        data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extension: Option<String>,
    },
}

/// JSON request body for complex mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexFillRequest {
    pub pdf: String,
    pub flatten: bool,
    pub fields: IndexMap<String, ApiField>,
}

/// JSON envelope some service builds wrap the filled PDF in
#[derive(Debug, Clone, Deserialize)]
pub struct PdfEnvelope {
    #[serde(alias = "data")]
    pub pdf: String,
}
