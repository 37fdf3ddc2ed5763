//! Core types for the arbor widget runtime.
//!
//! This crate provides the foundational identifier and error-code
//! types shared by every arbor layer.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Layer                               │
//! │  (stable surface widget authors depend on)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  arbor-types    : NodeId, RequestId, ErrorCode   ◄── HERE    │
//! │  arbor-widget   : Widget trait, events, requests, documents  │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Runtime Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  arbor-runtime  : tree, dispatch, render, task controller    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Identifier Design
//!
//! Identifiers are UUID-backed newtypes:
//!
//! - **Non-owning references**: the tree stores widgets in an arena;
//!   parents, subscriptions and purge queues refer to nodes by
//!   [`NodeId`] only, so ownership is never ambiguous
//! - **Serialization**: first-class serde support
//!
//! # Example
//!
//! ```
//! use arbor_types::{NodeId, RequestId};
//!
//! let node = NodeId::new();
//! let other = NodeId::new();
//! assert_ne!(node, other);
//!
//! let req = RequestId::new();
//! assert!(format!("{req}").starts_with("req:"));
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{NodeId, RequestId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_uniqueness() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn node_id_display() {
        let id = NodeId::new();
        let display = format!("{id}");
        assert!(display.starts_with("node:"));
        assert!(display.contains(&id.uuid().to_string()));
    }

    #[test]
    fn node_id_uuid() {
        let id = NodeId::new();
        assert_eq!(id.uuid(), id.0);
    }

    // NOTE: NodeId does not implement Default intentionally.
    // See id.rs for rationale.

    #[test]
    fn request_id_uniqueness() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn request_id_display() {
        let id = RequestId::new();
        let display = format!("{id}");
        assert!(display.starts_with("req:"));
        assert!(display.contains(&id.uuid().to_string()));
    }

    #[test]
    fn id_serde_round_trip() {
        let id = NodeId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
