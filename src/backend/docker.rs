//! Dockerized PDFtk backend
//!
//! Dispatches parse and fill calls to the REST service, choosing simple or
//! complex mapping per form.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use indexmap::IndexMap;
use serde_json::Value;

use super::registry::FillBackend;
use crate::config::{ConfigStore, FlattenSource, MappingMethod, ResponseEnvelope};
use crate::error::{FillPdfError, Result, TransportError};
use crate::mapping::{normalize_keys, pdftk_field_keys, FieldMapping, FillContext, FormTemplate};
use crate::messenger::Messenger;
use crate::storage::{path_info, FileStore};
use crate::transport::{
    ApiField, ComplexFillRequest, FieldDescriptor, PdfEnvelope, SimpleFillRequest, Transport,
};

pub const DOCKER_PDFTK_ID: &str = "docker_pdftk";

pub struct DockerPdftkBackend {
    transport: Arc<dyn Transport>,
    config: Arc<dyn ConfigStore>,
    files: Arc<dyn FileStore>,
    messenger: Arc<dyn Messenger>,
}

impl DockerPdftkBackend {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<dyn ConfigStore>,
        files: Arc<dyn FileStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            transport,
            config,
            files,
            messenger,
        }
    }

    /// URL the service fetches the template PDF from
    fn pdf_url(&self, template: &FormTemplate) -> String {
        self.files
            .external_url(&template.pdf_uri)
            .unwrap_or_else(|| {
                tracing::warn!(
                    fid = template.fid,
                    uri = %template.pdf_uri,
                    "Template PDF has no external URL"
                );
                String::new()
            })
    }

    /// Log a transport failure, tell the user, and convert it
    fn report(&self, error: TransportError) -> FillPdfError {
        tracing::error!(
            code = ?error.code,
            message = %error.message,
            "FillPDF Docker service request failed"
        );

        let text = if error.has_response() {
            format!(
                "There was a problem contacting the FillPDF Docker service. \
                 It may be down, or you may not have internet access. {}",
                error
            )
        } else {
            format!(
                "Unknown error occurred contacting the FillPDF Docker service. {}",
                error
            )
        };
        self.messenger.add_error(text);

        FillPdfError::Transport(error)
    }

    /// Turn mapped values into typed records.
    ///
    /// Only fields with an image payload become image records; every other
    /// value is sent as text, even when it looks like an image marker.
    fn complex_fields(&self, mapping: &FieldMapping) -> IndexMap<String, ApiField> {
        mapping
            .fields
            .iter()
            .map(|(key, value)| {
                let field = match mapping.images.get(key) {
                    Some(payload) => {
                        let (_, extension) = path_info(mapping.image_uri(key).unwrap_or_default());
                        ApiField::Image {
                            data: payload.data.clone(),
                            extension: (!extension.is_empty()).then(|| extension.to_string()),
                        }
                    }
                    None => ApiField::Text {
                        data: value.clone(),
                    },
                };
                (key.clone(), field)
            })
            .collect()
    }

    fn decode_response(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        if body.is_empty() {
            return Err(FillPdfError::Decode(
                "Empty response from the fill service".to_string(),
            ));
        }

        match self.config.response_envelope() {
            ResponseEnvelope::Raw => Ok(body),
            ResponseEnvelope::Json => {
                let envelope: PdfEnvelope = serde_json::from_slice(&body)
                    .map_err(|e| FillPdfError::Decode(format!("Invalid response envelope: {}", e)))?;
                base64::engine::general_purpose::STANDARD
                    .decode(envelope.pdf.as_bytes())
                    .map_err(|e| FillPdfError::Decode(format!("Invalid PDF encoding: {}", e)))
            }
        }
    }
}

#[async_trait]
impl FillBackend for DockerPdftkBackend {
    fn id(&self) -> &'static str {
        DOCKER_PDFTK_ID
    }

    fn label(&self) -> &'static str {
        "Dockerized PDFtk"
    }

    async fn parse(&self, template: &FormTemplate) -> Result<Vec<FieldDescriptor>> {
        let pdf_url = self.pdf_url(template);

        let raw = self
            .transport
            .get_fields(&pdf_url)
            .await
            .map_err(|e| self.report(e))?;

        if raw.is_empty() {
            tracing::warn!(fid = template.fid, "PDF does not contain fillable fields");
            self.messenger
                .add_warning("PDF does not contain fillable fields.".to_string());
            return Ok(Vec::new());
        }

        let keymap = pdftk_field_keys();
        let fields = raw
            .into_iter()
            .map(|descriptor| {
                serde_json::from_value(Value::Object(normalize_keys(descriptor, &keymap, false)))
            })
            .collect::<std::result::Result<Vec<FieldDescriptor>, _>>()
            .map_err(|e| FillPdfError::Decode(format!("Invalid field descriptor: {}", e)))?;

        tracing::info!(fid = template.fid, count = fields.len(), "Parsed PDF fields");

        Ok(fields)
    }

    async fn populate(
        &self,
        template: &FormTemplate,
        mapping: &FieldMapping,
        context: &FillContext,
    ) -> Result<Vec<u8>> {
        let settings = self.config.form_settings(&template.uuid);
        let flatten = match self.config.flatten_source() {
            FlattenSource::Form => settings.flatten,
            FlattenSource::Context => context.flatten,
        };
        let pdf = self.pdf_url(template);

        tracing::debug!(
            fid = template.fid,
            method = ?settings.mapping_method,
            flatten = flatten,
            "Populating PDF"
        );

        let response = match settings.mapping_method {
            MappingMethod::Simple => {
                let request = SimpleFillRequest {
                    pdf,
                    flatten,
                    fields: mapping.fields.clone(),
                };
                self.transport.fill_simple(&request).await
            }
            MappingMethod::Complex => {
                let request = ComplexFillRequest {
                    pdf,
                    flatten,
                    fields: self.complex_fields(mapping),
                };
                self.transport.fill_complex(&request).await
            }
        };

        let body = response.map_err(|e| self.report(e))?;
        self.decode_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, FormSettings};
    use crate::mapping::{FieldDefinition, MappingBuilder};
    use crate::messenger::{MessageLog, MessageType};
    use crate::record::{ElementDefinition, Record, SubmissionState};
    use crate::storage::LocalFileStore;
    use crate::transport::MockTransport;
    use serde_json::json;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        _dir: TempDir,
        files: Arc<LocalFileStore>,
        messages: Arc<MessageLog>,
        template: FormTemplate,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let files = Arc::new(LocalFileStore::new(dir.path(), "https://site.test/files"));
        let template = FormTemplate {
            fid: 4,
            uuid: Uuid::new_v4(),
            admin_title: "Release".to_string(),
            title: "Release".to_string(),
            pdf_uri: "public://fillpdf/release.pdf".to_string(),
            replacements: String::new(),
            fields: vec![
                FieldDefinition::new("name", "[webform_submission:values:name]"),
                FieldDefinition::new("sig", "[webform_submission:values:signature]"),
            ],
        };

        Fixture {
            _dir: dir,
            files,
            messages: Arc::new(MessageLog::new()),
            template,
        }
    }

    fn backend(
        fixture: &Fixture,
        transport: Arc<MockTransport>,
        config: BackendConfig,
    ) -> DockerPdftkBackend {
        DockerPdftkBackend::new(
            transport,
            Arc::new(config),
            fixture.files.clone(),
            fixture.messages.clone(),
        )
    }

    fn config_for(template: &FormTemplate, settings: FormSettings) -> BackendConfig {
        let mut config = BackendConfig::default();
        config.set_form_settings(template.uuid, settings);
        config
    }

    async fn mapping(fixture: &Fixture) -> FieldMapping {
        let file = fixture
            .files
            .save_data(b"sig-bytes", "public://uploads/sig.jpg")
            .await
            .unwrap();

        let mut record = Record::new(1, "release", SubmissionState::Completed);
        record.elements = vec![ElementDefinition::new("signature", "webform_image_file")];
        record.set_element_data("name", json!("Ada"));
        record.set_element_data("signature", json!(file.id));

        MappingBuilder::new(fixture.files.clone())
            .build(&fixture.template, &record)
            .await
    }

    #[tokio::test]
    async fn test_parse_normalizes_keys() {
        let fixture = fixture();
        let raw = json!({ "pdf_name": "first_name", "type": "Text" })
            .as_object()
            .cloned()
            .unwrap();
        let transport = Arc::new(MockTransport::new(vec![raw], b""));
        let backend = backend(&fixture, transport, BackendConfig::default());

        let fields = backend.parse(&fixture.template).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "first_name");
        assert!(!fields[0].extra.contains_key("pdf_name"));
    }

    #[tokio::test]
    async fn test_parse_empty_warns() {
        let fixture = fixture();
        let transport = Arc::new(MockTransport::new(vec![], b""));
        let backend = backend(&fixture, transport, BackendConfig::default());

        let fields = backend.parse(&fixture.template).await.unwrap();
        assert!(fields.is_empty());
        assert_eq!(fixture.messages.count(MessageType::Warning), 1);
        assert_eq!(fixture.messages.count(MessageType::Error), 0);
    }

    #[tokio::test]
    async fn test_parse_transport_error() {
        let fixture = fixture();
        let transport = Arc::new(MockTransport::failing(TransportError::new(Some(503), "down")));
        let backend = backend(&fixture, transport, BackendConfig::default());

        let err = backend.parse(&fixture.template).await.unwrap_err();
        assert!(matches!(err, FillPdfError::Transport(ref e) if e.code == Some(503)));
        assert_eq!(fixture.messages.count(MessageType::Error), 1);
    }

    #[tokio::test]
    async fn test_populate_simple() {
        let fixture = fixture();
        let mapping = mapping(&fixture).await;
        let transport = Arc::new(MockTransport::new(vec![], b"%PDF-simple"));
        let config = config_for(
            &fixture.template,
            FormSettings {
                mapping_method: MappingMethod::Simple,
                flatten: true,
            },
        );
        let backend = backend(&fixture, transport.clone(), config);

        let mut context = FillContext::new(1, fixture.template.fid);
        context.flatten = false;
        let pdf = backend
            .populate(&fixture.template, &mapping, &context)
            .await
            .unwrap();
        assert_eq!(pdf, b"%PDF-simple");

        let requests = transport.simple_requests.lock();
        assert_eq!(requests.len(), 1);
        // Per-form setting wins over the context by default
        assert!(requests[0].flatten);
        assert_eq!(requests[0].pdf, "https://site.test/files/fillpdf/release.pdf");
        // Image markers are passed through untouched
        assert_eq!(requests[0].fields["sig"], "{image}public://uploads/sig.jpg");
        assert!(transport.complex_requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_populate_complex() {
        let fixture = fixture();
        let mapping = mapping(&fixture).await;
        let transport = Arc::new(MockTransport::new(vec![], b"%PDF-complex"));
        let mut config = config_for(&fixture.template, FormSettings::default());
        config.flatten_source = FlattenSource::Context;
        let backend = backend(&fixture, transport.clone(), config);

        let context = FillContext::new(1, fixture.template.fid);
        backend
            .populate(&fixture.template, &mapping, &context)
            .await
            .unwrap();

        let requests = transport.complex_requests.lock();
        let request = &requests[0];
        assert!(request.flatten);
        assert_eq!(
            request.fields["name"],
            ApiField::Text {
                data: "Ada".to_string()
            }
        );

        // Decode the wire body and check the image record round-trips
        let body = serde_json::to_value(request).unwrap();
        let sig = &body["fields"]["sig"];
        assert_eq!(sig["type"], "image");
        assert_eq!(sig["extension"], "jpg");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(sig["data"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, b"sig-bytes");
    }

    #[tokio::test]
    async fn test_complex_marker_text_stays_text() {
        let fixture = fixture();
        fixture
            .files
            .save_data(b"TOP-SECRET", "private://secrets/key.txt")
            .await
            .unwrap();

        let mut mapping = FieldMapping::new();
        mapping.fields.insert(
            "comment".to_string(),
            "{image}private://secrets/key.txt".to_string(),
        );
        mapping
            .fields
            .insert("note".to_string(), "{image} hello".to_string());

        let transport = Arc::new(MockTransport::new(vec![], b"%PDF-complex"));
        let backend = backend(&fixture, transport.clone(), BackendConfig::default());

        backend
            .populate(&fixture.template, &mapping, &FillContext::new(1, 4))
            .await
            .unwrap();

        let requests = transport.complex_requests.lock();
        assert_eq!(
            requests[0].fields["comment"],
            ApiField::Text {
                data: "{image}private://secrets/key.txt".to_string()
            }
        );
        assert_eq!(
            requests[0].fields["note"],
            ApiField::Text {
                data: "{image} hello".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_populate_transport_error() {
        let fixture = fixture();
        let mapping = mapping(&fixture).await;
        let transport = Arc::new(MockTransport::failing(TransportError::new(Some(500), "boom")));
        let backend = backend(&fixture, transport, BackendConfig::default());

        let result = backend
            .populate(&fixture.template, &mapping, &FillContext::new(1, 4))
            .await;

        assert!(matches!(result, Err(FillPdfError::Transport(_))));
        assert_eq!(fixture.messages.count(MessageType::Error), 1);
    }

    #[tokio::test]
    async fn test_json_envelope() {
        let fixture = fixture();
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7");
        let body = serde_json::to_vec(&json!({ "pdf": encoded })).unwrap();
        let transport = Arc::new(MockTransport::new(vec![], &body));
        let mut config = config_for(
            &fixture.template,
            FormSettings {
                mapping_method: MappingMethod::Simple,
                flatten: false,
            },
        );
        config.response_envelope = ResponseEnvelope::Json;
        let backend = backend(&fixture, transport, config);

        let pdf = backend
            .populate(&fixture.template, &FieldMapping::new(), &FillContext::new(1, 4))
            .await
            .unwrap();
        assert_eq!(pdf, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_empty_response_is_error() {
        let fixture = fixture();
        let transport = Arc::new(MockTransport::new(vec![], b""));
        let config = config_for(
            &fixture.template,
            FormSettings {
                mapping_method: MappingMethod::Simple,
                flatten: false,
            },
        );
        let backend = backend(&fixture, transport, config);

        let result = backend
            .populate(&fixture.template, &FieldMapping::new(), &FillContext::new(1, 4))
            .await;
        assert!(matches!(result, Err(FillPdfError::Decode(_))));
    }
}
