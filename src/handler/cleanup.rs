//! Submission cleanup action
//!
//! Removes managed files referenced by a record, appends notes and
//! overwrites element values. Typically subscribed to the `deleted` state.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{default_states, display_debug, SubmissionHandler};
use crate::error::{FillPdfError, Result};
use crate::messenger::Messenger;
use crate::record::{ElementDefinition, Record, RecordStore, SubmissionState};
use crate::storage::{parse_file_id, FileStore};
use crate::token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionActionConfig {
    #[serde(default = "default_states")]
    pub states: Vec<SubmissionState>,
    /// Plain text appended to the record notes, tokens allowed
    #[serde(default)]
    pub notes: String,
    /// Element keys whose files are deleted and values cleared
    #[serde(default)]
    pub managed_files: Vec<String>,
    /// YAML mapping of element key to new value, tokens allowed
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub debug: bool,
}

impl Default for DeletionActionConfig {
    fn default() -> Self {
        Self {
            states: default_states(),
            notes: String::new(),
            managed_files: Vec::new(),
            data: String::new(),
            debug: false,
        }
    }
}

impl DeletionActionConfig {
    /// Check managed file keys and the YAML data against the form's elements
    pub fn validate(&self, elements: &[ElementDefinition]) -> Result<()> {
        for key in &self.managed_files {
            if !elements
                .iter()
                .any(|element| &element.key == key && element.is_managed_file())
            {
                return Err(FillPdfError::Config(format!(
                    "{} is not a managed file element.",
                    key
                )));
            }
        }

        for key in self.data_values()?.keys() {
            if !elements.iter().any(|element| &element.key == key) {
                return Err(FillPdfError::Config(format!(
                    "{} is not valid element key.",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Decode the YAML data into element values
    pub fn data_values(&self) -> Result<Map<String, Value>> {
        if self.data.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_yaml::from_str::<Value>(&self.data)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(FillPdfError::Config(
                "Data must be a mapping of element keys to values".to_string(),
            )),
        }
    }
}

pub struct DeletionAction {
    config: DeletionActionConfig,
    files: Arc<dyn FileStore>,
    records: Arc<dyn RecordStore>,
    messenger: Arc<dyn Messenger>,
}

impl DeletionAction {
    pub fn new(
        config: DeletionActionConfig,
        files: Arc<dyn FileStore>,
        records: Arc<dyn RecordStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config,
            files,
            records,
            messenger,
        }
    }

    pub fn config(&self) -> &DeletionActionConfig {
        &self.config
    }

    async fn delete_managed_files(&self, record: &mut Record) -> Result<()> {
        for key in &self.config.managed_files {
            match record.element_data(key).and_then(parse_file_id) {
                Some(file_id) => match self.files.delete(file_id).await {
                    Ok(()) => {
                        tracing::info!(sid = record.sid, element = %key, file_id = file_id, "Deleted managed file");
                    }
                    Err(FillPdfError::NotFound(_)) => {
                        tracing::warn!(sid = record.sid, element = %key, file_id = file_id, "Managed file already gone");
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    tracing::debug!(sid = record.sid, element = %key, "No managed file referenced");
                }
            }

            record.set_element_data(key, Value::String(String::new()));
        }
        Ok(())
    }

    fn append_notes(&self, record: &mut Record) {
        if self.config.notes.is_empty() {
            return;
        }

        let mut notes = record.notes.trim_end().to_string();
        if !notes.is_empty() {
            notes.push_str("\n\n");
        }
        notes.push_str(&token::resolve(&self.config.notes, record));
        record.notes = notes;
    }

    async fn clean(&self, record: &mut Record) -> Result<()> {
        // Bad YAML fails before anything is deleted
        let data = self.config.data_values()?;

        self.delete_managed_files(record).await?;
        self.append_notes(record);

        for (key, value) in &data {
            let resolved = token::resolve_value(value, record);
            record.set_element_data(key, resolved);
        }

        self.records.resave(record).await?;

        if self.config.debug {
            let managed = self.config.managed_files.join(", ");
            display_debug(
                self.messenger.as_ref(),
                "Deletion Action",
                record,
                &[
                    ("Managed files", managed.as_str()),
                    ("Notes", self.config.notes.as_str()),
                    ("Data", self.config.data.trim()),
                ],
            );
        }

        Ok(())
    }
}

#[async_trait]
impl SubmissionHandler for DeletionAction {
    fn id(&self) -> &'static str {
        "fillpdf_deletion"
    }

    fn states(&self) -> &[SubmissionState] {
        &self.config.states
    }

    async fn execute(&self, record: &mut Record) -> Result<()> {
        let result = self.clean(record).await;
        if let Err(e) = &result {
            tracing::error!(sid = record.sid, "Submission cleanup failed: {}", e);
            self.messenger
                .add_error(format!("Cleanup of this submission failed. {}", e));
        }
        result
    }
}
