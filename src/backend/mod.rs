//! Fill Backends
//!
//! A backend extracts fillable fields from a template PDF and fills it with
//! mapped values. Backends are registered in a [`BackendRegistry`] and
//! selected by id from configuration.

mod docker;
mod registry;

pub use docker::{DockerPdftkBackend, DOCKER_PDFTK_ID};
pub use registry::{BackendRegistry, FillBackend};
