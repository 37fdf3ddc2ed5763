//! Cooperative cancellation token handed to running jobs.

use std::sync::Arc;

use super::controller::Shared;
use super::job::JobError;

/// A job's view of the controller's stop flags.
///
/// Cancellation is two-tier. A *graceful* stop raises a flag the job is
/// expected to observe at its checkpoints and wind down from on its own
/// schedule. A *forced* stop additionally fails every subsequent token and
/// port interaction, so a job that keeps calling into the controller is
/// pushed out even if it ignores the graceful flag.
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Whether a graceful stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        let st = self.shared.state.lock();
        st.graceful || st.forced
    }

    /// Whether the controller has moved to a forced stop.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.shared.state.lock().forced
    }

    /// Cooperative stop point. Returns `Err(JobError::Cancelled)` once any
    /// stop has been requested; jobs bubble it with `?` to wind down.
    pub fn checkpoint(&self) -> Result<(), JobError> {
        if self.is_stop_requested() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}
