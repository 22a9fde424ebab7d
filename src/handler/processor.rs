//! Submission processor
//!
//! The only save path that fires handlers. Handlers themselves persist with
//! [`RecordStore::resave`], so a save never re-enters the processor.

use std::sync::Arc;

use super::SubmissionHandler;
use crate::error::Result;
use crate::record::{Record, RecordStore};

/// Persists records and runs the handlers subscribed to their state
pub struct SubmissionProcessor {
    records: Arc<dyn RecordStore>,
    handlers: Vec<Arc<dyn SubmissionHandler>>,
}

impl SubmissionProcessor {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn SubmissionHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Save `record`, then run every handler subscribed to its effective
    /// state in registration order.
    ///
    /// A failing handler is logged and the remaining handlers still run.
    /// Returns the number of handlers that completed.
    pub async fn save(&self, record: &mut Record) -> Result<usize> {
        self.records.resave(record).await?;

        let state = record.effective_state();
        let mut completed = 0;

        let subscribed: Vec<Arc<dyn SubmissionHandler>> = self
            .handlers
            .iter()
            .filter(|h| h.applies_to(record))
            .cloned()
            .collect();

        for handler in subscribed {
            tracing::debug!(sid = record.sid, handler = handler.id(), state = state.as_str(), "Running handler");

            match handler.execute(record).await {
                Ok(()) => completed += 1,
                Err(e) => {
                    tracing::error!(sid = record.sid, handler = handler.id(), "Handler failed: {}", e);
                }
            }
        }

        Ok(completed)
    }
}
