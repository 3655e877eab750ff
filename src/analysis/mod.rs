//! Meeting analysis: the result model, the remote service contract and the
//! pipeline that drives a single request through it.

pub mod error;
pub mod pipeline;
pub mod request;
pub mod result;
pub mod service;

pub use error::AnalysisError;
pub use pipeline::{AnalysisPipeline, PipelineOptions};
pub use request::AnalysisRequest;
pub use result::{AnalysisResult, MeetingPurpose, Sentiment};
pub use service::{AnalysisService, AudioPayload, HttpAnalysisService, AUDIO_FIELD};
