//! PDF fill action
//!
//! Fills the configured template with a record's values, stores the result
//! under the record's form and links the file back onto the record.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{default_states, display_debug, SubmissionHandler};
use crate::backend::{BackendRegistry, DOCKER_PDFTK_ID};
use crate::error::{FillPdfError, Result};
use crate::mapping::{FillContext, MappingBuilder};
use crate::messenger::{MessageType, Messenger};
use crate::record::{Record, RecordStore, SubmissionState};
use crate::storage::{FileStore, TemplateStore};
use crate::token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillActionConfig {
    #[serde(default = "default_states")]
    pub states: Vec<SubmissionState>,
    /// Template to fill; nothing happens when unset
    #[serde(default)]
    pub fillpdf: Option<u64>,
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Directory URI for generated files, tokens allowed.
    /// Defaults to `public://webform/{form id}`.
    #[serde(default)]
    pub destination: Option<String>,
    /// Record key the generated file id is stored under
    #[serde(default = "default_data_key")]
    pub data_key: String,
    /// Message shown after a successful fill, tokens allowed
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub debug: bool,
}

fn default_backend() -> String {
    DOCKER_PDFTK_ID.to_string()
}

fn default_data_key() -> String {
    "pdf".to_string()
}

impl Default for FillActionConfig {
    fn default() -> Self {
        Self {
            states: default_states(),
            fillpdf: None,
            backend: default_backend(),
            destination: None,
            data_key: default_data_key(),
            message: None,
            message_type: MessageType::Status,
            debug: false,
        }
    }
}

pub struct FillPdfAction {
    config: FillActionConfig,
    templates: Arc<dyn TemplateStore>,
    backends: BackendRegistry,
    files: Arc<dyn FileStore>,
    records: Arc<dyn RecordStore>,
    messenger: Arc<dyn Messenger>,
}

impl FillPdfAction {
    pub fn new(
        config: FillActionConfig,
        templates: Arc<dyn TemplateStore>,
        backends: BackendRegistry,
        files: Arc<dyn FileStore>,
        records: Arc<dyn RecordStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config,
            templates,
            backends,
            files,
            records,
            messenger,
        }
    }

    pub fn config(&self) -> &FillActionConfig {
        &self.config
    }

    fn destination(&self, record: &Record) -> String {
        let directory = match &self.config.destination {
            Some(pattern) => token::resolve(pattern, record),
            None => format!("public://webform/{}", record.webform_id),
        };
        directory.trim_end_matches('/').to_string()
    }

    async fn fill(&self, record: &mut Record) -> Result<()> {
        let Some(fid) = self.config.fillpdf else {
            tracing::debug!(sid = record.sid, "No template configured, skipping fill");
            return Ok(());
        };

        let Some(template) = self.templates.load(fid).await? else {
            return Err(FillPdfError::NotFound(format!("FillPDF form {}", fid)));
        };

        let backend = self.backends.get(&self.config.backend)?;

        let mapping = MappingBuilder::new(self.files.clone())
            .build(&template, record)
            .await;

        let mut context = FillContext::new(record.sid, fid);
        context.filename = build_filename(&template.title, record);

        let pdf = backend.populate(&template, &mapping, &context).await?;

        let destination = format!("{}/{}", self.destination(record), context.filename);
        let file = self.files.save_data(&pdf, &destination).await?;

        record.set_element_data(&self.config.data_key, json!(file.id));
        self.records.resave(record).await?;

        tracing::info!(
            fid = fid,
            sid = record.sid,
            file_id = file.id,
            uri = %file.uri,
            "Generated PDF for submission"
        );

        if let Some(message) = &self.config.message {
            let text = token::resolve(message, record);
            if !text.is_empty() {
                self.messenger.add_message(self.config.message_type, text);
            }
        }

        if self.config.debug {
            display_debug(
                self.messenger.as_ref(),
                "FillPDF Action",
                record,
                &[("File", file.uri.as_str())],
            );
        }

        Ok(())
    }

    /// Log a failed fill and tell the user
    fn report(&self, error: &FillPdfError) {
        tracing::error!(fid = ?self.config.fillpdf, "PDF fill failed: {}", error);

        let text = match error {
            // The backend has already shown the service error
            FillPdfError::Transport(_) => return,
            FillPdfError::NotFound(_) => {
                "FillPDF Form (fid) not found in the system. Please check the value in your FillPDF Link."
                    .to_string()
            }
            other => format!("The PDF for this submission could not be generated. {}", other),
        };
        self.messenger.add_error(text);
    }
}

#[async_trait]
impl SubmissionHandler for FillPdfAction {
    fn id(&self) -> &'static str {
        "fillpdf_action"
    }

    fn states(&self) -> &[SubmissionState] {
        &self.config.states
    }

    async fn execute(&self, record: &mut Record) -> Result<()> {
        let result = self.fill(record).await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }
}

/// Output filename for a title pattern.
///
/// Tokens are resolved, spaces become underscores, a trailing `.pdf` is
/// dropped, characters outside `[A-Za-z0-9_.-]` are removed and `.pdf` is
/// appended. Applying it to its own output returns the output unchanged.
pub fn build_filename(pattern: &str, record: &Record) -> String {
    let resolved = token::resolve(pattern, record).replace(' ', "_");

    let stem = if resolved.to_ascii_lowercase().ends_with(".pdf") {
        &resolved[..resolved.len() - 4]
    } else {
        resolved.as_str()
    };

    let mut filename: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    filename.push_str(".pdf");
    filename
}
