//! Error types for the FillPDF Docker backend

use std::fmt;

use thiserror::Error;

/// Result type alias for backend and action operations
pub type Result<T> = std::result::Result<T, FillPdfError>;

/// Failure talking to the remote fill service.
///
/// `code` is the HTTP status when the service answered, `None` when the
/// request never got a response (DNS, connection refused, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub code: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the service answered at all
    pub fn has_response(&self) -> bool {
        self.code.is_some()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[ERROR {}: {}]", code, self.message),
            None => write!(f, "[ERROR -: {}]", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            code: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum FillPdfError {
    /// Remote service failure
    #[error("Problem contacting the FillPDF Docker service {0}")]
    Transport(#[from] TransportError),

    /// Template or referenced file missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// No backend registered under the configured id
    #[error("Fill backend not registered: {0}")]
    BackendNotFound(String),

    /// File store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
