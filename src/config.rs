//! Configuration for the Dockerized PDFtk backend

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FillPdfError, Result};

pub const DEFAULT_ENDPOINT: &str = "rest.endpoint.local/api/1.0/pdftk";

/// Scheme used to reach the fill service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// How a form's values travel to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    /// One query parameter per field, text only
    Simple,
    /// Typed JSON records, images included
    #[default]
    Complex,
}

/// Where the flatten flag is read from when populating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlattenSource {
    /// Per-form settings keyed by template uuid
    #[default]
    Form,
    /// The caller's `FillContext`
    Context,
}

/// Shape of the `/fill` response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseEnvelope {
    /// The body is the PDF
    #[default]
    Raw,
    /// `{ "pdf": "<base64>" }`
    Json,
}

/// Per-form settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormSettings {
    #[serde(default)]
    pub mapping_method: MappingMethod,
    #[serde(default)]
    pub flatten: bool,
}

/// Read access to backend settings at dispatch time
pub trait ConfigStore: Send + Sync {
    /// `{scheme}://{endpoint}` without a trailing slash
    fn service_endpoint(&self) -> String;

    /// Settings for the form with the given uuid; defaults when unset
    fn form_settings(&self, form_uuid: &Uuid) -> FormSettings;

    fn flatten_source(&self) -> FlattenSource;

    fn response_envelope(&self) -> ResponseEnvelope;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub protocol: Protocol,
    pub endpoint: String,
    #[serde(default)]
    pub forms: HashMap<Uuid, FormSettings>,
    #[serde(default)]
    pub flatten_source: FlattenSource,
    #[serde(default)]
    pub response_envelope: ResponseEnvelope,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            protocol: Protocol::Https,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            forms: HashMap::new(),
            flatten_source: FlattenSource::Form,
            response_envelope: ResponseEnvelope::Raw,
        }
    }
}

impl BackendConfig {
    /// Load from `FILLPDF_*` environment variables (and a `.env` file, if any)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let protocol = match env::var("FILLPDF_REST_PROTOCOL")
            .unwrap_or_else(|_| "https".to_string())
            .as_str()
        {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            other => {
                return Err(FillPdfError::Config(format!(
                    "unsupported protocol: {}",
                    other
                )))
            }
        };

        let flatten_source = match env::var("FILLPDF_FLATTEN_SOURCE").ok().as_deref() {
            Some("context") => FlattenSource::Context,
            _ => FlattenSource::Form,
        };

        let response_envelope = match env::var("FILLPDF_RESPONSE_ENVELOPE").ok().as_deref() {
            Some("json") => ResponseEnvelope::Json,
            _ => ResponseEnvelope::Raw,
        };

        Ok(BackendConfig {
            protocol,
            endpoint: env::var("FILLPDF_REST_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            forms: HashMap::new(),
            flatten_source,
            response_envelope,
        })
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn set_form_settings(&mut self, form_uuid: Uuid, settings: FormSettings) -> &mut Self {
        self.forms.insert(form_uuid, settings);
        self
    }
}

impl ConfigStore for BackendConfig {
    fn service_endpoint(&self) -> String {
        format!(
            "{}://{}",
            self.protocol.as_str(),
            self.endpoint.trim_end_matches('/')
        )
    }

    fn form_settings(&self, form_uuid: &Uuid) -> FormSettings {
        self.forms.get(form_uuid).copied().unwrap_or_default()
    }

    fn flatten_source(&self) -> FlattenSource {
        self.flatten_source
    }

    fn response_envelope(&self) -> ResponseEnvelope {
        self.response_envelope
    }
}
