//! Processing stage machine.
//!
//! Tracks the stage of the single in-flight analysis request:
//! idle → transcribing → analyzing → saving → complete/failed → idle

pub mod status;

pub use status::{PipelineStage, PipelineState, PipelineStatusHandle, StageEvent};
