// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Errors the job manager returns directly. Refusals that are expected
/// outcomes of a well-formed call — cancelling a job that already finished,
/// interrupting one that was never running — are reported as structured
/// results, never as an `Err` variant here.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no job with id {0}")]
    UnknownJob(String),

    #[error("too many concurrent jobs (cap is {cap})")]
    TooManyConcurrentJobs { cap: usize },

    #[error("failed to spawn agent process: {0}")]
    SpawnError(#[from] std::io::Error),
}
