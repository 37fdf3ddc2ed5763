//! Background task control with interactive questions.
//!
//! A [`TaskController`] drives at most one [`Job`] at a time on a dedicated
//! worker thread. The embedding never talks to the thread directly: it
//! attaches jobs, polls status, answers the worker's questions, and asks
//! for graceful or forced stops. The worker talks back through its
//! [`JobCtx`]: a status log, a cooperative [`CancelToken`], and a blocking
//! [`QuestionPort`] for mid-run questions (confirmation, free text, or a
//! secret that is never echoed).

mod cancel;
mod controller;
mod job;
mod port;

pub use cancel::CancelToken;
pub use controller::{ControllerError, LogLine, Mode, StatusSnapshot, TaskController};
pub use job::{Job, JobCtx, JobError, Outcome};
pub use port::{Answer, PendingQuestion, QuestionPort};
