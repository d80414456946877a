//! Message contracts between the controlling thread and the filter worker.

use std::sync::Arc;

use darkroom_core::{EditParams, PixelBuffer};

/// Monotonically increasing job identifier. `0` is never issued.
pub type JobId = u64;

/// One filter request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingJob {
    pub id: JobId,
    pub params: EditParams,
}

/// Controller → worker.
#[derive(Debug)]
pub enum EngineRequest {
    /// Replace the worker's cached working buffer. Sent once per geometry
    /// change; filter-only changes reuse the cached buffer.
    SetSource(Arc<PixelBuffer>),
    /// Filter the cached buffer. Ignored when no source has been set.
    Process(ProcessingJob),
    Shutdown,
}

/// Worker → controller.
#[derive(Debug)]
pub struct ProcessedFrame {
    pub job_id: JobId,
    pub buffer: PixelBuffer,
}
