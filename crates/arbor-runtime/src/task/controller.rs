//! The task controller: one background worker at a time, observed and
//! steered through status polls.
//!
//! ```text
//!            attach                 worker exits
//!   Idle ───────────> Running ────────────────────┐
//!    ^                   │ graceful_stop          │
//!    │                   v                        v
//!    │             StopRequested ───────────> Finished
//!    │                   │ forced_stop  ^         │
//!    │                   v              │         │ close
//!    │              StopForced ─────────┘         │
//!    └────────────────────────────────────────────┘
//! ```
//!
//! All controller state lives behind one mutex with one condvar. The worker
//! thread signals the condvar unconditionally when it exits, whatever the
//! outcome, so nothing ever waits on a thread that is already gone. The
//! `Finished` transition happens in the same critical section that detaches
//! the join handle: the controller is never observed finished while a
//! worker is still attached.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use arbor_types::ErrorCode;
use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::job::{Job, JobCtx, JobError, Outcome};
use super::port::{Answer, PendingQuestion};

/// Controller lifecycle mode. See the module docs for the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Idle,
    Running,
    StopRequested,
    StopForced,
    Finished,
}

impl Mode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::StopRequested => "stop_requested",
            Self::StopForced => "stop_forced",
            Self::Finished => "finished",
        }
    }
}

/// One timestamped status-log line emitted by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub line: String,
}

/// Everything one status poll observes, taken in a single critical section
/// so concurrent pollers each see an internally consistent picture.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub mode: Mode,
    /// The question the worker is currently blocked on, if any.
    pub pending: Option<PendingQuestion>,
    /// Log lines drained by this poll. Each line is delivered to exactly
    /// one poller.
    pub lines: Vec<LogLine>,
    /// Set from the moment the worker exits until `close`.
    pub outcome: Option<Outcome>,
}

/// Errors raised by controller operations; all indicate misuse of the
/// lifecycle and are not recoverable, except a failed thread spawn.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("cannot attach in mode {0:?}")]
    NotIdle(Mode),

    #[error("no worker running (mode {0:?})")]
    NotRunning(Mode),

    #[error("cannot close in mode {0:?}")]
    NotFinished(Mode),

    #[error("no pending question")]
    NoPendingQuestion,

    #[error("answer kind does not match the pending question")]
    AnswerMismatch,

    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),

    #[error("controller state inconsistent: {0}")]
    Inconsistent(String),
}

impl ErrorCode for ControllerError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotIdle(_) => "CTRL_NOT_IDLE",
            Self::NotRunning(_) => "CTRL_NOT_RUNNING",
            Self::NotFinished(_) => "CTRL_NOT_FINISHED",
            Self::NoPendingQuestion => "CTRL_NO_PENDING_QUESTION",
            Self::AnswerMismatch => "CTRL_ANSWER_MISMATCH",
            Self::SpawnFailed(_) => "CTRL_SPAWN_FAILED",
            Self::Inconsistent(_) => "CTRL_INCONSISTENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::SpawnFailed(_))
    }
}

pub(crate) struct ControllerState {
    pub(crate) mode: Mode,
    pub(crate) handle: Option<JoinHandle<()>>,
    pub(crate) pending: Option<PendingQuestion>,
    pub(crate) answer: Option<Answer>,
    pub(crate) log: Vec<LogLine>,
    pub(crate) outcome: Option<Outcome>,
    /// Set by the worker's exit broadcast; cleared when the handle is
    /// collected into `Finished`.
    pub(crate) exited: bool,
    pub(crate) graceful: bool,
    pub(crate) forced: bool,
    /// Threads currently blocked in `join`. Must be zero at `close`.
    pub(crate) waiters: u32,
}

pub(crate) struct Shared {
    pub(crate) state: Mutex<ControllerState>,
    pub(crate) cond: Condvar,
}

impl Shared {
    pub(crate) fn push_log(&self, line: String) {
        let mut st = self.state.lock();
        st.log.push(LogLine {
            at: Utc::now(),
            line,
        });
    }
}

/// Owns at most one background worker and relays questions between it and
/// the operator. All methods take `&self`; the controller is safe to share
/// across request-handling threads.
pub struct TaskController {
    shared: Arc<Shared>,
}

impl Default for TaskController {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    mode: Mode::Idle,
                    handle: None,
                    pending: None,
                    answer: None,
                    log: Vec::new(),
                    outcome: None,
                    exited: false,
                    graceful: false,
                    forced: false,
                    waiters: 0,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Attaches a job and starts its worker thread. Only legal while idle;
    /// on any error no worker is started and no state changes.
    pub fn attach(&self, job: impl Job) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock();
        if st.mode != Mode::Idle {
            return Err(ControllerError::NotIdle(st.mode));
        }
        if st.handle.is_some() {
            return Err(ControllerError::Inconsistent(
                "idle with a worker attached".to_string(),
            ));
        }
        let shared = Arc::clone(&self.shared);
        // The worker's first lock acquisition waits on ours, so the reset
        // below is in place before it can observe anything.
        let handle = std::thread::Builder::new()
            .name("arbor-worker".to_string())
            .spawn(move || run_job(shared, job))
            .map_err(|e| ControllerError::SpawnFailed(e.to_string()))?;
        st.graceful = false;
        st.forced = false;
        st.pending = None;
        st.answer = None;
        st.outcome = None;
        st.exited = false;
        st.log.clear();
        st.handle = Some(handle);
        st.mode = Mode::Running;
        info!("worker attached");
        Ok(())
    }

    /// One status poll: mode, pending question, drained log lines, and the
    /// outcome once the worker has exited. Collects an exited worker into
    /// `Finished` as a side effect.
    pub fn poll(&self) -> StatusSnapshot {
        let mut st = self.shared.state.lock();
        let reaped = Self::collect_exit(&mut st, &self.shared.cond);
        let snapshot = StatusSnapshot {
            mode: st.mode,
            pending: st.pending.clone(),
            lines: std::mem::take(&mut st.log),
            outcome: st.outcome.clone(),
        };
        drop(st);
        reap(reaped);
        snapshot
    }

    /// Answers the worker's pending question, waking the blocked ask.
    pub fn answer(&self, answer: Answer) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock();
        let Some(question) = &st.pending else {
            return Err(ControllerError::NoPendingQuestion);
        };
        if !answer.matches(question) {
            return Err(ControllerError::AnswerMismatch);
        }
        st.pending = None;
        st.answer = Some(answer);
        self.shared.cond.notify_all();
        Ok(())
    }

    /// Requests a graceful stop. The worker keeps running until it observes
    /// the request at a checkpoint; a worker blocked on a question stays
    /// blocked. Repeating the request is a no-op.
    pub fn graceful_stop(&self) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock();
        match st.mode {
            Mode::Running => {
                st.graceful = true;
                st.mode = Mode::StopRequested;
                info!("graceful stop requested");
                Ok(())
            }
            Mode::StopRequested | Mode::StopForced => Ok(()),
            other => Err(ControllerError::NotRunning(other)),
        }
    }

    /// Forces a stop: every subsequent token or port interaction by the
    /// worker fails, and a worker blocked on a question is woken with a
    /// cancellation.
    pub fn forced_stop(&self) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock();
        match st.mode {
            Mode::Running | Mode::StopRequested => {
                st.graceful = true;
                st.forced = true;
                st.mode = Mode::StopForced;
                self.shared.cond.notify_all();
                info!("forced stop");
                Ok(())
            }
            Mode::StopForced => Ok(()),
            other => Err(ControllerError::NotRunning(other)),
        }
    }

    /// Blocks until the current worker (if any) has exited and been
    /// collected into `Finished`. Returns immediately when idle.
    pub fn join(&self) {
        let mut st = self.shared.state.lock();
        st.waiters += 1;
        let mut reaped = None;
        loop {
            if reaped.is_none() {
                reaped = Self::collect_exit(&mut st, &self.shared.cond);
            }
            if matches!(st.mode, Mode::Idle | Mode::Finished) {
                break;
            }
            self.shared.cond.wait(&mut st);
        }
        st.waiters -= 1;
        drop(st);
        reap(reaped);
    }

    /// Acknowledges a finished worker, returning the controller to idle so
    /// the next job can attach. Clears the outcome and any undrained log.
    pub fn close(&self) -> Result<(), ControllerError> {
        let mut st = self.shared.state.lock();
        if st.mode != Mode::Finished {
            return Err(ControllerError::NotFinished(st.mode));
        }
        if st.handle.is_some() {
            return Err(ControllerError::Inconsistent(
                "finished with a worker attached".to_string(),
            ));
        }
        if st.waiters != 0 {
            return Err(ControllerError::Inconsistent(format!(
                "{} join waiter(s) present at close",
                st.waiters
            )));
        }
        st.mode = Mode::Idle;
        st.outcome = None;
        st.pending = None;
        st.answer = None;
        st.log.clear();
        st.graceful = false;
        st.forced = false;
        debug!("controller closed");
        Ok(())
    }

    /// Moves an exited worker to `Finished`, detaching the handle in the
    /// same critical section. The caller reaps the handle after unlocking.
    fn collect_exit(st: &mut ControllerState, cond: &Condvar) -> Option<JoinHandle<()>> {
        if st.exited && st.handle.is_some() {
            let handle = st.handle.take();
            st.mode = Mode::Finished;
            cond.notify_all();
            handle
        } else {
            None
        }
    }
}

impl Drop for TaskController {
    /// A controller must not outlive its worker unattended: force a stop
    /// and wait for the exit broadcast, waking periodically in case the
    /// notify raced with our own teardown.
    fn drop(&mut self) {
        let mut st = self.shared.state.lock();
        if st.handle.is_none() {
            return;
        }
        st.graceful = true;
        st.forced = true;
        if !matches!(st.mode, Mode::Finished) {
            st.mode = Mode::StopForced;
        }
        self.shared.cond.notify_all();
        loop {
            if st.exited {
                if let Some(handle) = st.handle.take() {
                    st.mode = Mode::Finished;
                    drop(st);
                    reap(Some(handle));
                }
                return;
            }
            let _ = self
                .shared
                .cond
                .wait_for(&mut st, Duration::from_millis(100));
        }
    }
}

/// Joins an already-exited worker thread. The worker catches its own
/// panics, so a join error here is unexpected and only logged.
fn reap(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle
        && handle.join().is_err()
    {
        warn!("worker thread join failed");
    }
}

/// Worker-thread body. The exit broadcast at the bottom runs whatever
/// happens above it, including a panicking job.
fn run_job(shared: Arc<Shared>, mut job: impl Job) {
    let mut ctx = JobCtx::new(Arc::clone(&shared));
    let result = catch_unwind(AssertUnwindSafe(|| job.run(&mut ctx)));
    let outcome = match result {
        Ok(Ok(())) => Outcome::Completed,
        Ok(Err(JobError::Cancelled)) => Outcome::Cancelled,
        Ok(Err(JobError::Failed(reason))) => Outcome::Failed(reason),
        Err(_) => Outcome::Failed("worker panicked".to_string()),
    };
    info!(outcome = ?outcome, "worker exited");

    let mut st = shared.state.lock();
    st.outcome = Some(outcome);
    st.pending = None;
    st.answer = None;
    st.exited = true;
    shared.cond.notify_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::assert_error_codes;

    fn all_variants() -> Vec<ControllerError> {
        vec![
            ControllerError::NotIdle(Mode::Running),
            ControllerError::NotRunning(Mode::Idle),
            ControllerError::NotFinished(Mode::Running),
            ControllerError::NoPendingQuestion,
            ControllerError::AnswerMismatch,
            ControllerError::SpawnFailed("x".into()),
            ControllerError::Inconsistent("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "CTRL_");
    }

    #[test]
    fn only_spawn_failures_are_recoverable() {
        for err in all_variants() {
            assert_eq!(
                err.is_recoverable(),
                matches!(err, ControllerError::SpawnFailed(_)),
                "{err}"
            );
        }
    }

    #[test]
    fn mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Mode::StopRequested).unwrap(),
            "\"stop_requested\""
        );
        assert_eq!(Mode::StopForced.as_str(), "stop_forced");
    }
}
