use std::time::Duration;
use thiserror::Error;

/// everything that can stop a run. per-genome numeric anomalies never end up here,
/// they are coerced to a 0 score by `fitness::sanitize_score`.
#[derive(Debug, Error)]
pub enum EvolveError {
    /// rejected before the first generation runs
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("genome length mismatch: expected {expected} values, got {actual}")]
    GenomeLengthMismatch { expected: usize, actual: usize },

    /// a fitness job did not report back before the barrier deadline
    #[error("fitness evaluation timed out after {timeout:?} with {pending} of {total} chromosomes pending")]
    ConcurrencyTimeout {
        timeout: Duration,
        pending: usize,
        total: usize,
    },

    #[error("worker pool failure: {0}")]
    WorkerPool(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, EvolveError>;
