//! Transport trait and the reqwest-based REST client

use async_trait::async_trait;

use super::types::{ComplexFillRequest, RawFieldDescriptor, SimpleFillRequest};
use crate::error::TransportError;

/// Calls to the remote fill service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Discover the fillable fields of the PDF at `pdf_url`.
    /// An empty list is a successful result.
    async fn get_fields(&self, pdf_url: &str) -> Result<Vec<RawFieldDescriptor>, TransportError>;

    /// Fill with one query parameter per field; returns the response body
    async fn fill_simple(&self, request: &SimpleFillRequest) -> Result<Vec<u8>, TransportError>;

    /// Fill with a typed JSON body; returns the response body
    async fn fill_complex(&self, request: &ComplexFillRequest) -> Result<Vec<u8>, TransportError>;
}

/// REST client for the Dockerized PDFtk service
pub struct RestTransport {
    client: reqwest::Client,
    /// `{scheme}://{host}/{path}`
    endpoint: String,
}

impl RestTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }
}

#[async_trait]
impl Transport for RestTransport {
    async fn get_fields(&self, pdf_url: &str) -> Result<Vec<RawFieldDescriptor>, TransportError> {
        let form = reqwest::multipart::Form::new().text("pdf", pdf_url.to_string());

        let response = self
            .client
            .get(self.url("fields.json"))
            .multipart(form)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let fields: Option<Vec<RawFieldDescriptor>> = serde_json::from_slice(&body)
            .map_err(|e| TransportError::new(None, format!("Invalid field list: {}", e)))?;

        Ok(fields.unwrap_or_default())
    }

    async fn fill_simple(&self, request: &SimpleFillRequest) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(self.url("fill"))
            .query(&request.query_pairs())
            .send()
            .await?;

        read_success_body(response).await
    }

    async fn fill_complex(&self, request: &ComplexFillRequest) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(self.url("fill"))
            .json(request)
            .send()
            .await?;

        read_success_body(response).await
    }
}

/// Body of a 2xx response; anything else becomes a `TransportError`
async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unexpected status")
                .to_string()
        } else {
            body.trim().to_string()
        };
        return Err(TransportError::new(Some(status.as_u16()), message));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Mock transport for testing
#[cfg(test)]
pub struct MockTransport {
    pub fields: Result<Vec<RawFieldDescriptor>, TransportError>,
    pub fill: Result<Vec<u8>, TransportError>,
    pub simple_requests: parking_lot::Mutex<Vec<SimpleFillRequest>>,
    pub complex_requests: parking_lot::Mutex<Vec<ComplexFillRequest>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new(fields: Vec<RawFieldDescriptor>, fill: &[u8]) -> Self {
        Self {
            fields: Ok(fields),
            fill: Ok(fill.to_vec()),
            simple_requests: parking_lot::Mutex::new(Vec::new()),
            complex_requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            fields: Err(error.clone()),
            fill: Err(error),
            simple_requests: parking_lot::Mutex::new(Vec::new()),
            complex_requests: parking_lot::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    async fn get_fields(&self, _pdf_url: &str) -> Result<Vec<RawFieldDescriptor>, TransportError> {
        self.fields.clone()
    }

    async fn fill_simple(&self, request: &SimpleFillRequest) -> Result<Vec<u8>, TransportError> {
        self.simple_requests.lock().push(request.clone());
        self.fill.clone()
    }

    async fn fill_complex(&self, request: &ComplexFillRequest) -> Result<Vec<u8>, TransportError> {
        self.complex_requests.lock().push(request.clone());
        self.fill.clone()
    }
}
