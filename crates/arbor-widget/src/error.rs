//! Widget layer errors.
//!
//! Errors that can occur inside widget handlers and ingestion.
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Code Convention
//!
//! All widget errors use the `WIDGET_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`UnexpectedEvent`](WidgetError::UnexpectedEvent) | `WIDGET_UNEXPECTED_EVENT` | No |
//! | [`InvalidField`](WidgetError::InvalidField) | `WIDGET_INVALID_FIELD` | Yes |
//! | [`NotSupported`](WidgetError::NotSupported) | `WIDGET_NOT_SUPPORTED` | No |
//! | [`Internal`](WidgetError::Internal) | `WIDGET_INTERNAL` | No |
//!
//! # Taxonomy
//!
//! `UnexpectedEvent` is the wiring-bug case: a handler received an
//! event name it never subscribed to. Silently ignoring it would hide
//! the bad subscription, so it propagates and aborts the request.
//! `InvalidField` is ordinary user input gone wrong; the owning widget
//! catches it at the ingest boundary and turns it into validation
//! state instead of failing the render.

use arbor_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Widget layer error.
///
/// # Example
///
/// ```
/// use arbor_widget::WidgetError;
/// use arbor_types::ErrorCode;
///
/// let err = WidgetError::UnexpectedEvent("selected".into());
/// assert_eq!(err.code(), "WIDGET_UNEXPECTED_EVENT");
/// assert!(!err.is_recoverable());
///
/// let err = WidgetError::InvalidField {
///     field: "port".into(),
///     reason: "not a number".into(),
/// };
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum WidgetError {
    /// A handler received an event name it does not expect.
    ///
    /// This is a programming error (a bad subscription or a missing
    /// match arm), not a condition to recover from.
    #[error("unexpected event: {0}")]
    UnexpectedEvent(String),

    /// A submitted field value was malformed or out of range.
    ///
    /// **Recoverable** - the widget reports it as validation state and
    /// the user can resubmit.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Node-local field name.
        field: String,
        /// Human-readable explanation for the validation display.
        reason: String,
    },

    /// Operation not supported by this widget.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Invariant violation inside the tree machinery.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for WidgetError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedEvent(_) => "WIDGET_UNEXPECTED_EVENT",
            Self::InvalidField { .. } => "WIDGET_INVALID_FIELD",
            Self::NotSupported(_) => "WIDGET_NOT_SUPPORTED",
            Self::Internal(_) => "WIDGET_INTERNAL",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidField { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::assert_error_codes;

    fn all_variants() -> Vec<WidgetError> {
        vec![
            WidgetError::UnexpectedEvent("x".into()),
            WidgetError::InvalidField {
                field: "x".into(),
                reason: "y".into(),
            },
            WidgetError::NotSupported("x".into()),
            WidgetError::Internal("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "WIDGET_");
    }

    #[test]
    fn unexpected_event_is_programming_error() {
        let err = WidgetError::UnexpectedEvent("selected".into());
        assert_eq!(err.code(), "WIDGET_UNEXPECTED_EVENT");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("unexpected event"));
    }

    #[test]
    fn invalid_field_is_recoverable() {
        let err = WidgetError::InvalidField {
            field: "count".into(),
            reason: "not a number".into(),
        };
        assert_eq!(err.code(), "WIDGET_INVALID_FIELD");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn internal_not_recoverable() {
        let err = WidgetError::Internal("slot missing".into());
        assert!(!err.is_recoverable());
    }
}
