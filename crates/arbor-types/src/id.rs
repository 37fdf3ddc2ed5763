//! Identifier types for arbor.
//!
//! All identifiers are UUID-based so they stay unique across trees and
//! are safe to embed in serialized documents and log lines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle for a node in the widget tree.
///
/// A `NodeId` identifies an arena slot, not a path: the human-readable
/// path segment name lives in the tree's node metadata and is only
/// unique among siblings, while the `NodeId` is unique across the whole
/// tree for its lifetime.
///
/// Event subscriptions and parent/child links are stored as `NodeId`s,
/// which keeps ownership of the widget itself in exactly one place (the
/// arena slot) and makes every cross-reference non-owning.
///
/// # Example
///
/// ```
/// use arbor_types::NodeId;
///
/// let a = NodeId::new();
/// let b = NodeId::new();
/// assert_ne!(a, b);
/// println!("node handle: {}", a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - see below
impl NodeId {
    /// Creates a new [`NodeId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

// NOTE: NodeId intentionally does NOT implement Default.
// Default::default() would mint a handle that no arena slot backs;
// nodes are created through the tree (insert/adopt), never bare.

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Identifier for one inbound page request.
///
/// Each request/render invocation carries its own `RequestId`; the
/// render pass uses it to tag log output and the one-shot ingest locks
/// it holds are scoped to exactly one id.
///
/// # Example
///
/// ```
/// use arbor_types::RequestId;
///
/// let id = RequestId::new();
/// println!("request: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - RequestId is generated by PageRequest constructors
impl RequestId {
    /// Creates a new [`RequestId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

// NOTE: RequestId intentionally does NOT implement Default.
// Ids are minted by the request constructors; a defaulted id would
// never correspond to an actual inbound request.

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req:{}", self.0)
    }
}
