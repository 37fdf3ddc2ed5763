//! Versioned widget state documents.
//!
//! A [`WidgetDocument`] carries a widget's serialized state together
//! with a type identifier and a format version, so state written by
//! one process can be restored by another, and state written by a
//! *newer* implementation is rejected rather than half-applied.
//!
//! # Design
//!
//! Persistence is an **optional** capability: the [`Widget`] trait's
//! `save`/`load` default to [`DocumentError::NotSupported`]. A widget
//! that does support documents owns its current format version and
//! accepts every version at or below it, filling later fields with
//! defaults.
//!
//! # Example
//!
//! ```
//! use arbor_widget::{WidgetDocument, DocumentError};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct CounterState {
//!     count: u64,
//! }
//!
//! const COUNTER_DOC: &str = "counter";
//! const COUNTER_VERSION: u32 = 1;
//!
//! let doc = WidgetDocument::from_state(COUNTER_DOC, COUNTER_VERSION, &CounterState { count: 3 })
//!     .expect("state should serialize");
//!
//! doc.check(COUNTER_DOC, COUNTER_VERSION).expect("current doc loads");
//! let state: CounterState = doc.to_state().unwrap();
//! assert_eq!(state.count, 3);
//! ```
//!
//! [`Widget`]: crate::Widget

use arbor_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during document operations.
///
/// All document errors are attributable to a specific document; none
/// of them should crash the process. The conventional recovery is for
/// the owning widget to fall back to cleared defaults.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document was written by a newer implementation.
    #[error("document version {found} exceeds supported version {supported}")]
    VersionAhead {
        /// Highest version this implementation understands.
        supported: u32,
        /// Version recorded in the document.
        found: u32,
    },

    /// The document carries a different type identifier.
    #[error("document type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        /// Type identifier the loading widget expected.
        expected: String,
        /// Type identifier found in the document.
        found: String,
    },

    /// A required field is missing or malformed.
    #[error("invalid document data: {0}")]
    InvalidData(String),

    /// The widget does not support documents.
    #[error("widget {0} does not support state documents")]
    NotSupported(String),
}

impl ErrorCode for DocumentError {
    fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "DOC_SERIALIZATION",
            Self::VersionAhead { .. } => "DOC_VERSION_AHEAD",
            Self::TypeMismatch { .. } => "DOC_TYPE_MISMATCH",
            Self::InvalidData(_) => "DOC_INVALID_DATA",
            Self::NotSupported(_) => "DOC_NOT_SUPPORTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Document errors are reported, the widget clears itself, and
        // the process carries on. Only NotSupported is a wiring bug.
        !matches!(self, Self::NotSupported(_))
    }
}

/// A widget's serialized state, tagged with type and format version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetDocument {
    /// Type identifier of the widget that produced this document.
    pub doc_type: String,
    /// Format version at write time.
    pub version: u32,
    /// Serialized widget state.
    pub state: serde_json::Value,
}

impl WidgetDocument {
    /// Creates a document from serializable state.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialization`] if the state cannot be
    /// serialized.
    pub fn from_state<T: Serialize>(
        doc_type: impl Into<String>,
        version: u32,
        state: &T,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            doc_type: doc_type.into(),
            version,
            state: serde_json::to_value(state)?,
        })
    }

    /// Deserializes the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialization`] if the stored value
    /// does not match `T`.
    pub fn to_state<T: for<'de> Deserialize<'de>>(&self) -> Result<T, DocumentError> {
        Ok(serde_json::from_value(self.state.clone())?)
    }

    /// Validates type identifier and version against the loader.
    ///
    /// Versions at or below `supported` pass; the loader fills fields
    /// added after `self.version` with defaults.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::TypeMismatch`] if `doc_type` differs
    /// - [`DocumentError::VersionAhead`] if the document is newer than
    ///   the loading implementation
    pub fn check(&self, doc_type: &str, supported: u32) -> Result<(), DocumentError> {
        if self.doc_type != doc_type {
            return Err(DocumentError::TypeMismatch {
                expected: doc_type.to_string(),
                found: self.doc_type.clone(),
            });
        }
        if self.version > supported {
            return Err(DocumentError::VersionAhead {
                supported,
                found: self.version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::assert_error_codes;
    use serde_json::json;

    fn all_variants() -> Vec<DocumentError> {
        vec![
            DocumentError::Serialization(serde_json::from_str::<u32>("x").unwrap_err()),
            DocumentError::VersionAhead {
                supported: 1,
                found: 2,
            },
            DocumentError::TypeMismatch {
                expected: "a".into(),
                found: "b".into(),
            },
            DocumentError::InvalidData("x".into()),
            DocumentError::NotSupported("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "DOC_");
    }

    #[test]
    fn from_state_and_back() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct S {
            n: u32,
        }
        let doc = WidgetDocument::from_state("s", 1, &S { n: 7 }).unwrap();
        assert_eq!(doc.doc_type, "s");
        assert_eq!(doc.version, 1);
        let back: S = doc.to_state().unwrap();
        assert_eq!(back, S { n: 7 });
    }

    #[test]
    fn check_accepts_older_versions() {
        let doc = WidgetDocument {
            doc_type: "choice".into(),
            version: 1,
            state: json!({}),
        };
        assert!(doc.check("choice", 2).is_ok());
    }

    #[test]
    fn check_rejects_newer_versions() {
        let doc = WidgetDocument {
            doc_type: "choice".into(),
            version: 3,
            state: json!({}),
        };
        let err = doc.check("choice", 2).unwrap_err();
        assert_eq!(err.code(), "DOC_VERSION_AHEAD");
        assert!(err.is_recoverable());
    }

    #[test]
    fn check_rejects_wrong_type() {
        let doc = WidgetDocument {
            doc_type: "label".into(),
            version: 1,
            state: json!({}),
        };
        let err = doc.check("choice", 2).unwrap_err();
        assert_eq!(err.code(), "DOC_TYPE_MISMATCH");
    }

    #[test]
    fn to_state_bad_shape_is_serialization_error() {
        let doc = WidgetDocument {
            doc_type: "s".into(),
            version: 1,
            state: json!("not an object"),
        };
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct S {
            n: u32,
        }
        let err = doc.to_state::<S>().unwrap_err();
        assert_eq!(err.code(), "DOC_SERIALIZATION");
    }
}
