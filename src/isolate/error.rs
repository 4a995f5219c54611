//! Failures of the isolation machinery itself (not of the target).

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum IsolationError {
    #[error("failed to create worker pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("failed to fork worker: {0}")]
    Fork(#[source] io::Error),
    /// The worker exited (panic, signal) before writing its report.
    #[error("worker exited without reporting ({status})")]
    WorkerDied { status: String },
    #[error("failed to decode worker report: {0}")]
    Decode(#[source] serde_json::Error),
    /// Error raised inside the worker, carried back as text.
    #[error("worker failed: {0}")]
    Remote(String),
    #[error("process isolation is not supported on this platform")]
    Unsupported,
}
