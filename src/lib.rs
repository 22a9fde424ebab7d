//! FillPDF Docker Backend
//!
//! Fills PDF templates through a remote, Dockerized PDFtk REST service and
//! runs the submission actions that drive it.
//!
//! # Modules
//!
//! - `backend`: fill backends (parse/populate) and the registry that selects them
//! - `transport`: HTTP client for the `fields.json` and `fill` endpoints
//! - `mapping`: template types, field mapping builder and key normalization
//! - `token`: `[webform_submission:...]` reference resolution
//! - `handler`: fill and cleanup actions plus the submission processor
//! - `storage`, `record`, `messenger`: capabilities provided by the host
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fillpdf_docker::{
//!     backend::{BackendRegistry, DockerPdftkBackend},
//!     config::BackendConfig,
//!     transport::RestTransport,
//! };
//!
//! let config = Arc::new(BackendConfig::from_env()?);
//! let transport = Arc::new(RestTransport::new(config.service_endpoint()));
//! let backend = DockerPdftkBackend::new(transport, config, files, messenger);
//!
//! let mut registry = BackendRegistry::new();
//! registry.register(Arc::new(backend));
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod handler;
pub mod mapping;
pub mod messenger;
pub mod record;
pub mod storage;
pub mod telemetry;
pub mod token;
pub mod transport;

pub use error::{FillPdfError, Result, TransportError};
