//! Darkroom Engine: background filtering and job sequencing.
//!
//! [`PipelineEngine`] owns the single filter worker thread. [`Orchestrator`]
//! sits on the controlling thread: it runs the geometry stage, keeps one
//! pending job, and drops results that a newer request has superseded.

pub mod error;
pub mod messages;
pub mod orchestrator;
pub mod worker;

pub use error::EngineError;
pub use messages::{EngineRequest, JobId, ProcessedFrame, ProcessingJob};
pub use orchestrator::{FrameOutcome, Orchestrator, OrchestratorStats};
pub use worker::PipelineEngine;
