//! Submission records
//!
//! A record is the submission whose values populate a template. Storage is
//! provided by the host through [`RecordStore`], which only exposes a silent
//! save: persisting through it never fires submission handlers.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Element type of image uploads
pub const IMAGE_FILE_ELEMENT: &str = "webform_image_file";

/// Submission lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Draft,
    Converted,
    Completed,
    Updated,
    Deleted,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Draft => "draft",
            SubmissionState::Converted => "converted",
            SubmissionState::Completed => "completed",
            SubmissionState::Updated => "updated",
            SubmissionState::Deleted => "deleted",
        }
    }
}

/// An input element of the form the record was submitted through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub element_type: String,
}

impl ElementDefinition {
    pub fn new(key: &str, element_type: &str) -> Self {
        Self {
            key: key.to_string(),
            title: String::new(),
            element_type: element_type.to_string(),
        }
    }

    pub fn is_image_file(&self) -> bool {
        self.element_type == IMAGE_FILE_ELEMENT
    }

    /// Any element backed by a managed file (`*_file` types)
    pub fn is_managed_file(&self) -> bool {
        self.element_type.ends_with("_file")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub sid: u64,
    pub uuid: Uuid,
    pub webform_id: String,
    pub state: SubmissionState,
    /// Results are not stored; every save counts as `completed`
    #[serde(default)]
    pub results_disabled: bool,
    #[serde(default)]
    pub elements: Vec<ElementDefinition>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub notes: String,
}

impl Record {
    pub fn new(sid: u64, webform_id: &str, state: SubmissionState) -> Self {
        Self {
            sid,
            uuid: Uuid::new_v4(),
            webform_id: webform_id.to_string(),
            state,
            results_disabled: false,
            elements: Vec::new(),
            data: Map::new(),
            notes: String::new(),
        }
    }

    /// State used to match handler subscriptions
    pub fn effective_state(&self) -> SubmissionState {
        if self.results_disabled {
            SubmissionState::Completed
        } else {
            self.state
        }
    }

    pub fn element_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set_element_data(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    pub fn image_elements(&self) -> impl Iterator<Item = &ElementDefinition> {
        self.elements.iter().filter(|e| e.is_image_file())
    }
}

/// Record persistence without handler invocation
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self, sid: u64) -> Result<Option<Record>>;

    /// Persist the record without firing lifecycle hooks
    async fn resave(&self, record: &Record) -> Result<()>;
}

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<u64, Record>>,
    writes: RwLock<usize>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes since creation
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load(&self, sid: u64) -> Result<Option<Record>> {
        Ok(self.records.read().await.get(&sid).cloned())
    }

    async fn resave(&self, record: &Record) -> Result<()> {
        self.records.write().await.insert(record.sid, record.clone());
        *self.writes.write().await += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effective_state_results_disabled() {
        let mut record = Record::new(1, "contact", SubmissionState::Draft);
        assert_eq!(record.effective_state(), SubmissionState::Draft);

        record.results_disabled = true;
        assert_eq!(record.effective_state(), SubmissionState::Completed);
    }

    #[test]
    fn test_element_kinds() {
        let image = ElementDefinition::new("photo", "webform_image_file");
        let document = ElementDefinition::new("cv", "webform_document_file");
        let text = ElementDefinition::new("name", "textfield");

        assert!(image.is_image_file());
        assert!(image.is_managed_file());
        assert!(!document.is_image_file());
        assert!(document.is_managed_file());
        assert!(!text.is_managed_file());
    }

    #[tokio::test]
    async fn test_memory_store_resave() {
        let store = MemoryRecordStore::new();
        let mut record = Record::new(7, "contact", SubmissionState::Completed);
        record.set_element_data("name", json!("Ada"));

        store.resave(&record).await.unwrap();
        let loaded = store.load(7).await.unwrap().unwrap();

        assert_eq!(loaded.element_data("name"), Some(&json!("Ada")));
        assert_eq!(store.write_count().await, 1);
        assert!(store.load(8).await.unwrap().is_none());
    }
}
