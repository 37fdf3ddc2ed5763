//! Error type for tree structure and dispatch operations.

use arbor_types::ErrorCode;
use arbor_widget::WidgetError;
use thiserror::Error;

/// Errors raised by [`Tree`](super::Tree) operations.
///
/// Structural variants (`NoSuchPath`, `AlreadyOwned`, ...) indicate misuse of
/// the tree API and are not recoverable. `Widget` wraps a handler failure and
/// inherits the wrapped error's recoverability.
#[derive(Debug, Error)]
pub enum TreeError {
    /// No node exists at the given dot-separated path.
    #[error("no node at path: {0}")]
    NoSuchPath(String),

    /// The node id is not present in the tree.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Attempted to adopt a node that already has a parent.
    #[error("node already owned: {0}")]
    AlreadyOwned(String),

    /// Adoption would make a node its own ancestor.
    #[error("adoption would create a cycle at: {0}")]
    Cycle(String),

    /// A sibling with the same name already exists under the parent.
    #[error("duplicate child name under {parent}: {name}")]
    DuplicateName { parent: String, name: String },

    /// The node is not a child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    /// Fired or subscribed to an event name the source never registered.
    #[error("event '{event}' is not registered on {node}")]
    UnregisteredEvent { node: String, event: String },

    /// The node at the path is not of the requested widget type.
    #[error("widget type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: String, expected: &'static str },

    /// A widget handler returned an error during dispatch or render.
    #[error("widget error: {0}")]
    Widget(#[from] WidgetError),
}

impl ErrorCode for TreeError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoSuchPath(_) => "TREE_NO_SUCH_PATH",
            Self::UnknownNode(_) => "TREE_UNKNOWN_NODE",
            Self::AlreadyOwned(_) => "TREE_ALREADY_OWNED",
            Self::Cycle(_) => "TREE_CYCLE",
            Self::DuplicateName { .. } => "TREE_DUPLICATE_NAME",
            Self::NotAChild { .. } => "TREE_NOT_A_CHILD",
            Self::UnregisteredEvent { .. } => "TREE_UNREGISTERED_EVENT",
            Self::TypeMismatch { .. } => "TREE_TYPE_MISMATCH",
            Self::Widget(inner) => inner.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Widget(inner) => inner.is_recoverable(),
            _ => false,
        }
    }
}
