//! The question port: how a running job asks its operator something.
//!
//! A job blocks on one of the `ask` methods; the pending question surfaces
//! in the next status poll, the operator answers through the controller,
//! and the blocked call wakes with the answer. At most one question is
//! outstanding at a time (the worker is single-threaded), and a forced
//! stop wakes any blocked ask with a cancellation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::controller::Shared;
use super::job::JobError;

/// A question the worker is currently blocked on, as seen by a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingQuestion {
    /// Yes/no confirmation before the job pauses or proceeds.
    Pause { prompt: String },
    /// Free-text answer. `echo: false` marks the value as sensitive, so
    /// surfaces presenting the question must mask the input.
    Text { prompt: String, echo: bool },
    /// Sensitive string (passphrase). Never echoed back.
    Secret { prompt: String },
}

impl PendingQuestion {
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Self::Pause { prompt } | Self::Text { prompt, .. } | Self::Secret { prompt } => prompt,
        }
    }

    #[must_use]
    pub fn is_pause(&self) -> bool {
        matches!(self, Self::Pause { .. })
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    #[must_use]
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret { .. })
    }
}

/// An operator's answer to a [`PendingQuestion`]. The variant must match
/// the pending question's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Pause(bool),
    Text(String),
    Secret(String),
}

impl Answer {
    pub(crate) fn matches(&self, question: &PendingQuestion) -> bool {
        matches!(
            (self, question),
            (Answer::Pause(_), PendingQuestion::Pause { .. })
                | (Answer::Text(_), PendingQuestion::Text { .. })
                | (Answer::Secret(_), PendingQuestion::Secret { .. })
        )
    }
}

/// The job-side endpoint. Every method blocks the calling worker thread
/// until an answer arrives or the controller forces a stop.
pub struct QuestionPort {
    shared: Arc<Shared>,
}

impl QuestionPort {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Asks for yes/no confirmation before pausing.
    pub fn confirm_pause(&self, prompt: impl Into<String>) -> Result<bool, JobError> {
        let answer = self.ask(PendingQuestion::Pause {
            prompt: prompt.into(),
        })?;
        match answer {
            Answer::Pause(yes) => Ok(yes),
            _ => Err(JobError::Failed("mismatched answer kind".to_string())),
        }
    }

    /// Asks for a string. `echo` controls whether surfaces may display the
    /// typed value.
    pub fn ask_string(&self, prompt: impl Into<String>, echo: bool) -> Result<String, JobError> {
        let answer = self.ask(PendingQuestion::Text {
            prompt: prompt.into(),
            echo,
        })?;
        match answer {
            Answer::Text(value) => Ok(value),
            _ => Err(JobError::Failed("mismatched answer kind".to_string())),
        }
    }

    /// Asks for a secret (passphrase). The value is handed to the job and
    /// never surfaces in status polls or logs.
    pub fn ask_secret(&self, prompt: impl Into<String>) -> Result<String, JobError> {
        let answer = self.ask(PendingQuestion::Secret {
            prompt: prompt.into(),
        })?;
        match answer {
            Answer::Secret(value) => Ok(value),
            _ => Err(JobError::Failed("mismatched answer kind".to_string())),
        }
    }

    fn ask(&self, question: PendingQuestion) -> Result<Answer, JobError> {
        let mut st = self.shared.state.lock();
        if st.forced {
            return Err(JobError::Cancelled);
        }
        if st.pending.is_some() || st.answer.is_some() {
            return Err(JobError::Failed("question slot occupied".to_string()));
        }
        debug!(prompt = question.prompt(), "job asks");
        st.pending = Some(question);
        self.shared.cond.notify_all();
        loop {
            if let Some(answer) = st.answer.take() {
                return Ok(answer);
            }
            if st.forced {
                st.pending = None;
                return Err(JobError::Cancelled);
            }
            self.shared.cond.wait(&mut st);
        }
    }
}
