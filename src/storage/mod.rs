//! File and template storage
//!
//! Both are host capabilities. A local filesystem file store and an
//! in-memory template store are provided.

mod local;
mod templates;
mod types;

pub use local::LocalFileStore;
pub use templates::{MemoryTemplateStore, TemplateStore};
pub use types::*;
