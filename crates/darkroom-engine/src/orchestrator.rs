//! Controller-side job sequencing.
//!
//! At most one job is in flight on the worker. Requests made while it runs
//! overwrite a single pending slot, so a burst of slider updates costs at
//! most one extra filter pass. A frame is shown only if its id is still the
//! newest issued; anything older is dropped.

use std::sync::Arc;

use darkroom_core::{EditParams, GeometryParams, PixelBuffer, apply_geometry};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::messages::{JobId, ProcessedFrame, ProcessingJob};
use crate::worker::PipelineEngine;

/// What happened to a frame taken from the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Newest job; now the edited buffer.
    Delivered(JobId),
    /// Superseded by a later request or a new image.
    Discarded(JobId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorStats {
    /// Jobs handed to the worker.
    pub dispatched: u64,
    pub delivered: u64,
    pub discarded: u64,
    /// Pending jobs overwritten before they started.
    pub coalesced: u64,
    /// Working buffers sent to the worker.
    pub sources_sent: u64,
}

/// Drives a [`PipelineEngine`] on behalf of an interactive editor.
pub struct Orchestrator {
    engine: PipelineEngine,
    raw: Option<PixelBuffer>,
    working: Option<Arc<PixelBuffer>>,
    edited: Option<PixelBuffer>,
    /// Geometry the worker's current source was built with.
    source_geometry: Option<GeometryParams>,
    last_issued: JobId,
    /// Newest id whose result may still be shown.
    latest: JobId,
    in_flight: Option<JobId>,
    pending: Option<ProcessingJob>,
    stats: OrchestratorStats,
}

impl Orchestrator {
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self::with_engine(PipelineEngine::spawn()?))
    }

    pub fn with_engine(engine: PipelineEngine) -> Self {
        Self {
            engine,
            raw: None,
            working: None,
            edited: None,
            source_geometry: None,
            last_issued: 0,
            latest: 0,
            in_flight: None,
            pending: None,
            stats: OrchestratorStats::default(),
        }
    }

    /// Replace the original image.
    ///
    /// Working and edited buffers and the pending job are cleared; a job
    /// already on the worker will be discarded when it finishes.
    pub fn load_image(&mut self, raw: PixelBuffer) {
        info!(width = raw.width(), height = raw.height(), "image loaded");
        self.raw = Some(raw);
        self.working = None;
        self.edited = None;
        self.source_geometry = None;
        self.pending = None;
        self.last_issued += 1;
        self.latest = self.last_issued;
    }

    /// Ask for `params` to be rendered. Returns the new job id, or `None`
    /// when no image is loaded.
    pub fn request(&mut self, params: &EditParams) -> Result<Option<JobId>, EngineError> {
        if self.raw.is_none() {
            return Ok(None);
        }
        self.last_issued += 1;
        let id = self.last_issued;
        self.latest = id;
        let job = ProcessingJob {
            id,
            params: params.clone(),
        };

        if self.in_flight.is_some() {
            if let Some(old) = self.pending.replace(job) {
                self.stats.coalesced += 1;
                debug!(replaced = old.id, by = id, "pending job coalesced");
            }
        } else {
            self.dispatch(job)?;
        }
        Ok(Some(id))
    }

    /// Handle a finished frame if one is ready, without blocking.
    pub fn poll(&mut self) -> Result<Option<FrameOutcome>, EngineError> {
        if self.in_flight.is_none() {
            return Ok(None);
        }
        match self.engine.try_next_frame()? {
            Some(frame) => self.receive(frame).map(Some),
            None => Ok(None),
        }
    }

    /// Block for the in-flight frame, if any.
    pub fn wait(&mut self) -> Result<Option<FrameOutcome>, EngineError> {
        if self.in_flight.is_none() {
            return Ok(None);
        }
        let frame = self.engine.next_frame()?;
        self.receive(frame).map(Some)
    }

    /// Block until the worker is idle and nothing is pending.
    pub fn wait_until_idle(&mut self) -> Result<(), EngineError> {
        while self.wait()?.is_some() {}
        Ok(())
    }

    /// The buffer a viewer should show.
    ///
    /// With `show_original` this is the geometry-only buffer; otherwise the
    /// newest filtered result, falling back to the working and then the raw
    /// buffer while nothing has been delivered.
    pub fn view(&self, show_original: bool) -> Option<&PixelBuffer> {
        if show_original {
            return self.working.as_deref().or(self.raw.as_ref());
        }
        self.edited
            .as_ref()
            .or(self.working.as_deref())
            .or(self.raw.as_ref())
    }

    pub fn raw(&self) -> Option<&PixelBuffer> {
        self.raw.as_ref()
    }

    pub fn edited(&self) -> Option<&PixelBuffer> {
        self.edited.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn latest_job(&self) -> Option<JobId> {
        (self.latest > 0).then_some(self.latest)
    }

    pub fn stats(&self) -> OrchestratorStats {
        self.stats
    }

    fn dispatch(&mut self, job: ProcessingJob) -> Result<(), EngineError> {
        let Some(raw) = self.raw.as_ref() else {
            return Ok(());
        };
        if self.source_geometry.as_ref() != Some(&job.params.geometry) {
            let working = Arc::new(apply_geometry(raw, &job.params.geometry));
            self.engine.set_source(Arc::clone(&working))?;
            self.working = Some(working);
            self.edited = None;
            self.source_geometry = Some(job.params.geometry.clone());
            self.stats.sources_sent += 1;
        }
        let id = job.id;
        self.engine.process(job)?;
        self.in_flight = Some(id);
        self.stats.dispatched += 1;
        Ok(())
    }

    fn receive(&mut self, frame: ProcessedFrame) -> Result<FrameOutcome, EngineError> {
        self.in_flight = None;
        let outcome = if frame.job_id == self.latest {
            self.edited = Some(frame.buffer);
            self.stats.delivered += 1;
            FrameOutcome::Delivered(frame.job_id)
        } else {
            self.stats.discarded += 1;
            debug!(job_id = frame.job_id, latest = self.latest, "stale frame discarded");
            FrameOutcome::Discarded(frame.job_id)
        };

        if let Some(job) = self.pending.take() {
            self.dispatch(job)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_image_is_noop() {
        let mut orch = Orchestrator::new().unwrap();
        assert_eq!(orch.request(&EditParams::default()).unwrap(), None);
        assert!(!orch.is_busy());
        assert!(orch.view(false).is_none());
        assert_eq!(orch.poll().unwrap(), None);
    }

    #[test]
    fn test_view_falls_back_to_raw_before_first_request() {
        let mut orch = Orchestrator::new().unwrap();
        let raw = PixelBuffer::filled(2, 2, [1, 2, 3, 255]);
        orch.load_image(raw.clone());
        assert_eq!(orch.view(false), Some(&raw));
        assert_eq!(orch.view(true), Some(&raw));
    }

    #[test]
    fn test_ids_increase() {
        let mut orch = Orchestrator::new().unwrap();
        orch.load_image(PixelBuffer::new(2, 2));
        let a = orch.request(&EditParams::default()).unwrap().unwrap();
        let b = orch.request(&EditParams::default()).unwrap().unwrap();
        assert!(b > a);
        assert_eq!(orch.latest_job(), Some(b));
    }
}
