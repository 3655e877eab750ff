use thiserror::Error;

use crate::media::ValidationError;
use crate::notification::Notification;
use crate::pipeline::PipelineStage;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Analysis service error: {message}")]
    Service {
        /// HTTP status, absent for transport failures.
        status: Option<u16>,
        message: String,
    },

    #[error("An analysis is already in progress (currently {stage})")]
    Busy { stage: PipelineStage },

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("Failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis request {request_id} was abandoned")]
    Abandoned { request_id: u64 },

    #[error("No file selected")]
    NoSelection,
}

impl AnalysisError {
    pub fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// True for failures the user recovers from by submitting again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Service { .. } | Self::MalformedResponse(_) | Self::Io { .. }
        )
    }

    /// The single notice shown for this failure.
    pub fn notification(&self) -> Notification {
        match self {
            Self::Validation(_) => Notification::error(
                "Invalid file type",
                "Please upload a .wav, .mp3, or .mp4 file",
            ),
            Self::Service { .. } | Self::MalformedResponse(_) => Notification::error(
                "Processing Failed",
                "There was an error processing your audio file. Please try again.",
            ),
            Self::Busy { .. } => Notification::error(
                "Analysis in progress",
                "Please wait for the current analysis to finish.",
            ),
            Self::Io { name, .. } => Notification::error(
                "Processing Failed",
                format!("Could not read {name}. Please choose the file again."),
            ),
            Self::Abandoned { .. } => Notification::info(
                "Analysis cancelled",
                "A newer analysis replaced this one.",
            ),
            Self::NoSelection => {
                Notification::error("No file selected", "Choose a recording to analyze first.")
            }
        }
    }
}
