//! A single upload-and-analyze attempt.

use tracing::debug;

use super::error::AnalysisError;
use super::result::AnalysisResult;
use super::service::{AudioPayload, AUDIO_FIELD};
use crate::media::{mime_type_for_extension, MediaFile};

pub struct AnalysisRequest {
    id: u64,
    file: MediaFile,
}

impl AnalysisRequest {
    pub fn new(id: u64, file: MediaFile) -> Self {
        Self { id, file }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    /// Package the recording as the multipart upload.
    pub async fn payload(&self) -> Result<AudioPayload, AnalysisError> {
        let bytes = self.file.read_bytes().await.map_err(|source| AnalysisError::Io {
            name: self.file.name().to_string(),
            source,
        })?;

        let mime_type = self
            .file
            .extension()
            .as_deref()
            .and_then(mime_type_for_extension)
            .unwrap_or("application/octet-stream");

        Ok(AudioPayload {
            field: AUDIO_FIELD,
            file_name: self.file.name().to_string(),
            mime_type,
            bytes,
        })
    }

    /// Map the service's JSON body onto the result model.
    pub fn parse_response(body: &str) -> Result<AnalysisResult, AnalysisError> {
        let result: AnalysisResult = serde_json::from_str(body)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        debug!(
            "Parsed analysis: {} transcript chars, {} tags, {} timestamps",
            result.transcript.len(),
            result.auto_tags.len(),
            result.timestamps.len()
        );
        Ok(result)
    }
}
