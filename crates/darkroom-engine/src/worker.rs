//! The filter worker thread and its owning handle.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use darkroom_core::{PixelBuffer, apply_filters};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::messages::{EngineRequest, ProcessedFrame, ProcessingJob};

const WORKER_THREAD_NAME: &str = "darkroom-filter";

/// Handle to the background filter worker.
///
/// The worker processes one request at a time in arrival order. Dropping
/// the handle stops the worker and joins its thread.
///
/// The blocking calls ([`next_frame`](Self::next_frame)) must not be made
/// from inside an async runtime.
pub struct PipelineEngine {
    requests: mpsc::UnboundedSender<EngineRequest>,
    frames: mpsc::UnboundedReceiver<ProcessedFrame>,
    thread: Option<JoinHandle<()>>,
}

impl PipelineEngine {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self, EngineError> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();

        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || run_worker(request_rx, frame_tx))
            .map_err(EngineError::Spawn)?;

        info!("filter worker started");
        Ok(Self {
            requests: request_tx,
            frames: frame_rx,
            thread: Some(thread),
        })
    }

    /// Hand the worker a new working buffer.
    pub fn set_source(&self, buffer: Arc<PixelBuffer>) -> Result<(), EngineError> {
        self.send(EngineRequest::SetSource(buffer))
    }

    /// Queue a filter job against the current working buffer.
    pub fn process(&self, job: ProcessingJob) -> Result<(), EngineError> {
        self.send(EngineRequest::Process(job))
    }

    /// Take a finished frame if one is ready.
    pub fn try_next_frame(&mut self) -> Result<Option<ProcessedFrame>, EngineError> {
        match self.frames.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EngineError::WorkerGone),
        }
    }

    /// Block until the next finished frame arrives.
    pub fn next_frame(&mut self) -> Result<ProcessedFrame, EngineError> {
        self.frames.blocking_recv().ok_or(EngineError::WorkerGone)
    }

    fn send(&self, request: EngineRequest) -> Result<(), EngineError> {
        self.requests.send(request).map_err(|_| EngineError::WorkerGone)
    }
}

impl Drop for PipelineEngine {
    fn drop(&mut self) {
        let _ = self.requests.send(EngineRequest::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("filter worker panicked");
        }
    }
}

fn run_worker(
    mut requests: mpsc::UnboundedReceiver<EngineRequest>,
    frames: mpsc::UnboundedSender<ProcessedFrame>,
) {
    let mut source: Option<Arc<PixelBuffer>> = None;

    while let Some(request) = requests.blocking_recv() {
        match request {
            EngineRequest::SetSource(buffer) => {
                debug!(width = buffer.width(), height = buffer.height(), "worker source replaced");
                source = Some(buffer);
            }
            EngineRequest::Process(job) => {
                let Some(src) = source.as_deref() else {
                    debug!(job_id = job.id, "no source set, job ignored");
                    continue;
                };
                let started = Instant::now();
                let buffer = apply_filters(src, &job.params);
                debug!(
                    job_id = job.id,
                    elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "job finished"
                );
                if frames.send(ProcessedFrame { job_id: job.id, buffer }).is_err() {
                    break;
                }
            }
            EngineRequest::Shutdown => break,
        }
    }
    info!("filter worker stopped");
}
