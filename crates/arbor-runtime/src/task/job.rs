//! The unit of background work and its view of the controller.

use std::sync::Arc;

use arbor_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cancel::CancelToken;
use super::controller::Shared;
use super::port::QuestionPort;

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The job ran to the end of its work.
    Completed,
    /// The job wound down after observing a stop request.
    Cancelled,
    /// The job returned an error or panicked.
    Failed(String),
}

/// Errors a running job reports back to the controller.
#[derive(Debug, Error)]
pub enum JobError {
    /// The job observed a stop request and is winding down.
    #[error("job cancelled")]
    Cancelled,

    /// The job hit an unrecoverable problem.
    #[error("job failed: {0}")]
    Failed(String),
}

impl ErrorCode for JobError {
    fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "JOB_CANCELLED",
            Self::Failed(_) => "JOB_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // A failed job may be re-attached; a cancel was asked for.
        matches!(self, Self::Failed(_))
    }
}

/// A background job driven on a worker thread by the controller.
///
/// Implementations should call [`JobCtx::checkpoint`] at natural pause
/// points and bubble its error with `?` so graceful stops take effect.
pub trait Job: Send + 'static {
    fn run(&mut self, ctx: &mut JobCtx) -> Result<(), JobError>;
}

/// Closures work as jobs directly, which keeps tests and small embedders
/// free of one-off types.
impl<F> Job for F
where
    F: FnMut(&mut JobCtx) -> Result<(), JobError> + Send + 'static,
{
    fn run(&mut self, ctx: &mut JobCtx) -> Result<(), JobError> {
        self(ctx)
    }
}

/// Everything a job may touch while running: the cancellation token, the
/// question port, and the status log.
pub struct JobCtx {
    pub token: CancelToken,
    pub port: QuestionPort,
    shared: Arc<Shared>,
}

impl JobCtx {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            token: CancelToken::new(Arc::clone(&shared)),
            port: QuestionPort::new(Arc::clone(&shared)),
            shared,
        }
    }

    /// Appends a line to the controller's status log, timestamped now.
    /// The next status poll drains it.
    pub fn log(&self, line: impl Into<String>) {
        self.shared.push_log(line.into());
    }

    /// Shorthand for [`CancelToken::checkpoint`].
    pub fn checkpoint(&self) -> Result<(), JobError> {
        self.token.checkpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&[JobError::Cancelled, JobError::Failed("x".into())], "JOB_");
    }

    #[test]
    fn only_failures_are_recoverable() {
        assert!(JobError::Failed("x".into()).is_recoverable());
        assert!(!JobError::Cancelled.is_recoverable());
    }
}
