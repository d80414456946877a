/// Errors from the background worker boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to spawn filter worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("filter worker has stopped")]
    WorkerGone,
}
