//! User-visible messages
//!
//! The host decides how messages reach the end user; actions and backends
//! only report them here.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Status,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageType,
    pub text: String,
}

pub trait Messenger: Send + Sync {
    fn add_message(&self, kind: MessageType, text: String);

    fn add_error(&self, text: String) {
        self.add_message(MessageType::Error, text);
    }

    fn add_warning(&self, text: String) {
        self.add_message(MessageType::Warning, text);
    }
}

/// In-memory messenger; collects messages for the host to drain
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<Message>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected messages
    pub fn drain(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    pub fn count(&self, kind: MessageType) -> usize {
        self.messages.lock().iter().filter(|m| m.kind == kind).count()
    }
}

impl Messenger for MessageLog {
    fn add_message(&self, kind: MessageType, text: String) {
        self.messages.lock().push(Message { kind, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_log_drain() {
        let log = MessageLog::new();
        log.add_warning("PDF does not contain fillable fields.".to_string());
        log.add_error("boom".to_string());

        assert_eq!(log.count(MessageType::Warning), 1);
        assert_eq!(log.count(MessageType::Error), 1);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, MessageType::Warning);
        assert!(log.messages().is_empty());
    }
}
