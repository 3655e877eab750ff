//! Selected recordings and the extension gate in front of the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

/// Extensions the analysis service accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "mp4"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {name}. Please upload a .wav, .mp3, or .mp4 file")]
    UnsupportedType { name: String },
}

/// Where the bytes of a selected file live.
#[derive(Debug, Clone)]
enum MediaContent {
    Path(PathBuf),
    Memory(Arc<Vec<u8>>),
}

/// A recording chosen by the user.
#[derive(Debug, Clone)]
pub struct MediaFile {
    name: String,
    size: u64,
    content: MediaContent,
}

impl MediaFile {
    /// Select a file on disk. Only metadata is read here.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            content: MediaContent::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content: MediaContent::Memory(Arc::new(bytes)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }

    /// Lower-cased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.content {
            MediaContent::Path(path) => fs::read(path).await,
            MediaContent::Memory(bytes) => Ok(bytes.as_ref().clone()),
        }
    }
}

/// Upload hint for the multipart part. Never used to decide acceptance.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

pub struct FileValidator;

impl FileValidator {
    /// Accept a file iff its name ends in a supported extension, ignoring case.
    pub fn validate(file: &MediaFile) -> Result<(), ValidationError> {
        Self::validate_name(file.name())
    }

    pub fn validate_name(name: &str) -> Result<(), ValidationError> {
        let lower = name.to_lowercase();
        let supported = SUPPORTED_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")));

        if supported {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedType {
                name: name.to_string(),
            })
        }
    }
}
