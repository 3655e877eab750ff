//! Analysis orchestrator.
//!
//! Owns the selected-file and displayed-result cells and drives one request
//! at a time through the stage machine:
//! validate → transcribe (upload) → analyze → save → complete → idle
//!
//! The service is injected so the same pipeline runs against the real
//! endpoint or a stand-in.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::error::AnalysisError;
use super::request::AnalysisRequest;
use super::result::AnalysisResult;
use super::service::AnalysisService;
use crate::config::PipelineConfig;
use crate::media::{FileValidator, MediaFile};
use crate::notification::Notification;
use crate::pipeline::{PipelineStage, PipelineStatusHandle};

/// Pacing of the progress stages that follow the single service call.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub analyzing_delay: Duration,
    pub saving_delay: Duration,
}

impl PipelineOptions {
    /// No pacing between stages.
    pub fn immediate() -> Self {
        Self {
            analyzing_delay: Duration::ZERO,
            saving_delay: Duration::ZERO,
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            analyzing_delay: config.analyzing_delay(),
            saving_delay: config.saving_delay(),
        }
    }
}

pub struct AnalysisPipeline {
    service: Box<dyn AnalysisService>,
    status: PipelineStatusHandle,
    options: PipelineOptions,
    selection: Mutex<Option<MediaFile>>,
    result: Mutex<Option<Arc<AnalysisResult>>>,
}

impl AnalysisPipeline {
    pub fn new(
        service: Box<dyn AnalysisService>,
        status: PipelineStatusHandle,
        options: PipelineOptions,
    ) -> Self {
        Self {
            service,
            status,
            options,
            selection: Mutex::new(None),
            result: Mutex::new(None),
        }
    }

    pub fn status(&self) -> &PipelineStatusHandle {
        &self.status
    }

    /// Replace the selected file. A rejected file also clears the previous
    /// selection; an accepted one clears the displayed result.
    pub async fn select(&self, file: MediaFile) -> Result<Notification, AnalysisError> {
        let mut selection = self.selection.lock().await;

        if let Err(e) = FileValidator::validate(&file) {
            warn!("Rejected selection {}: {}", file.name(), e);
            *selection = None;
            return Err(e.into());
        }

        let notice = Notification::info(
            "File uploaded successfully",
            format!("Selected {} ({:.2}MB)", file.name(), file.size_mb()),
        );
        info!("Selected {} ({} bytes)", file.name(), file.size());
        *selection = Some(file);
        self.result.lock().await.take();

        Ok(notice)
    }

    pub async fn selected(&self) -> Option<MediaFile> {
        self.selection.lock().await.clone()
    }

    pub async fn latest_result(&self) -> Option<Arc<AnalysisResult>> {
        self.result.lock().await.clone()
    }

    /// Abandon the in-flight request, if any. Its late outcome is discarded.
    pub async fn reset(&self) {
        self.status.reset().await;
    }

    /// Analyze the selected file. The selection is dropped on success and
    /// kept on failure so the user can retry.
    pub async fn submit(&self) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let file = self.selected().await.ok_or(AnalysisError::NoSelection)?;
        let result = self.run(file).await?;
        self.selection.lock().await.take();
        Ok(result)
    }

    /// Run one upload-and-analyze attempt.
    ///
    /// Rejected with `Busy` while another request is in flight. Whatever the
    /// outcome, the pipeline is back in `Idle` when this returns.
    pub async fn run(&self, file: MediaFile) -> Result<Arc<AnalysisResult>, AnalysisError> {
        FileValidator::validate(&file)?;

        let request_id = self.status.begin(file.name()).await?;
        let mut in_flight = InFlight {
            status: &self.status,
            request_id,
            settled: false,
        };
        let request = AnalysisRequest::new(request_id, file);
        info!(
            "Request {}: analyzing {} via {}",
            request_id,
            request.file().name(),
            self.service.name()
        );

        let outcome = match self.drive(&request).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Request {} failed: {}", request_id, e);
                if self.status.fail(request_id, e.to_string()).await {
                    self.status.acknowledge(request_id).await;
                }
                Err(e)
            }
        };
        in_flight.settled = true;
        outcome
    }

    async fn drive(&self, request: &AnalysisRequest) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let payload = request.payload().await?;
        let body = self.service.analyze(payload).await?;

        self.enter(request, PipelineStage::Analyzing).await?;
        let result = Arc::new(AnalysisRequest::parse_response(&body)?);
        Self::pace(self.options.analyzing_delay).await;

        self.enter(request, PipelineStage::Saving).await?;
        Self::pace(self.options.saving_delay).await;

        // Complete and publish under one result lock.
        let mut published = self.result.lock().await;
        self.enter(request, PipelineStage::Complete).await?;
        *published = Some(Arc::clone(&result));
        drop(published);

        self.status.acknowledge(request.id()).await;
        info!(
            "Request {} complete: {} ({})",
            request.id(),
            result.meeting_purpose,
            result.sentiment
        );
        Ok(result)
    }

    async fn enter(
        &self,
        request: &AnalysisRequest,
        stage: PipelineStage,
    ) -> Result<(), AnalysisError> {
        if self.status.advance(request.id(), stage).await {
            Ok(())
        } else {
            warn!("Request {} abandoned before {}", request.id(), stage);
            Err(AnalysisError::Abandoned {
                request_id: request.id(),
            })
        }
    }

    async fn pace(delay: Duration) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

/// Releases the pipeline if `run` is dropped before it settles.
struct InFlight<'a> {
    status: &'a PipelineStatusHandle,
    request_id: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.status.abandon(self.request_id);
        }
    }
}
