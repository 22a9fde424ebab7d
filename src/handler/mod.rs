//! Submission Handlers
//!
//! Actions that run after a record is saved, when its lifecycle state is one
//! the handler subscribes to:
//! - [`FillPdfAction`] fills a template and attaches the PDF to the record
//! - [`DeletionAction`] removes files and updates values, e.g. on deletion
//!
//! Handlers persist their changes through [`RecordStore::resave`], which
//! never fires handlers again. Only [`SubmissionProcessor::save`] does.
//!
//! [`RecordStore::resave`]: crate::record::RecordStore::resave

mod cleanup;
mod fill;
mod processor;

pub use cleanup::{DeletionAction, DeletionActionConfig};
pub use fill::{build_filename, FillActionConfig, FillPdfAction};
pub use processor::SubmissionProcessor;

use async_trait::async_trait;

use crate::error::Result;
use crate::messenger::{MessageType, Messenger};
use crate::record::{Record, SubmissionState};

#[async_trait]
pub trait SubmissionHandler: Send + Sync {
    fn id(&self) -> &'static str;

    /// States that trigger this handler
    fn states(&self) -> &[SubmissionState];

    /// Run the action. Changes to `record` must be persisted silently.
    async fn execute(&self, record: &mut Record) -> Result<()>;

    fn applies_to(&self, record: &Record) -> bool {
        self.states().contains(&record.effective_state())
    }
}

fn default_states() -> Vec<SubmissionState> {
    vec![SubmissionState::Completed]
}

/// Show what an action did when debugging is enabled
fn display_debug(messenger: &dyn Messenger, label: &str, record: &Record, details: &[(&str, &str)]) {
    let mut text = format!(
        "Debug: Action: {}\nState: {}",
        label,
        record.effective_state().as_str()
    );
    for (title, value) in details {
        text.push_str(&format!("\n{}: {}", title, value));
    }
    messenger.add_message(MessageType::Warning, text);
}
