//! Client for the remote transcription and analysis endpoint.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, error, info};

use super::error::AnalysisError;

/// Multipart field the service reads the recording from.
pub const AUDIO_FIELD: &str = "audio";

/// Outbound upload: one file under one multipart field.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub field: &'static str,
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl AudioPayload {
    pub fn into_form(self) -> Result<Form, AnalysisError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime_type)
            .map_err(|e| AnalysisError::service(None, format!("Invalid MIME type: {e}")))?;
        Ok(Form::new().part(self.field, part))
    }
}

/// One call per payload, returning the raw JSON body of a 2xx response.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, payload: AudioPayload) -> Result<String, AnalysisError>;
}

pub struct HttpAnalysisService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AnalysisError::service(None, format!("Failed to build HTTP client: {e}"))
            })?;

        info!("Initialized analysis service with endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    fn name(&self) -> &'static str {
        "HTTP analysis service"
    }

    async fn analyze(&self, payload: AudioPayload) -> Result<String, AnalysisError> {
        info!(
            "Uploading {} ({} bytes) to {}",
            payload.file_name,
            payload.bytes.len(),
            self.endpoint
        );

        let form = payload.into_form()?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Analysis request failed to send: {}", e);
                AnalysisError::service(None, format!("Failed to reach analysis service: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AnalysisError::service(
                Some(status.as_u16()),
                format!("Failed to read response body: {e}"),
            )
        })?;

        if !status.is_success() {
            error!("Analysis request failed with status {}: {}", status, body);
            return Err(AnalysisError::service(
                Some(status.as_u16()),
                format!("Analysis request failed ({status}): {body}"),
            ));
        }

        debug!("Analysis response: {} bytes", body.len());
        Ok(body)
    }
}
