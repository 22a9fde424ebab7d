//! REST Transport
//!
//! HTTP access to the Dockerized PDFtk service:
//! - `GET {endpoint}/fields.json` with a multipart `pdf` part
//! - `POST {endpoint}/fill`, either with flat query parameters (simple)
//!   or a typed JSON body (complex)
//!
//! Failures are not retried; no timeout beyond the client default is set.

mod client;
mod types;

pub use client::{RestTransport, Transport};
pub use types::*;

#[cfg(test)]
pub use client::MockTransport;
