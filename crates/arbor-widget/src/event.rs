//! Named events exchanged between tree nodes.
//!
//! Events are delivered synchronously, in subscription order, before
//! the firing call returns. There is no payload: an event is a name
//! plus its source node, and the listener reads whatever state it
//! needs from the source through the tree.
//!
//! # Edge-Triggering
//!
//! Delivery is edge-triggered on state change, not level-triggered:
//! a setter that observes no actual change fires nothing. That
//! discipline lives in the widgets; the dispatcher only guarantees
//! order and synchrony.

use arbor_types::NodeId;
use serde::{Deserialize, Serialize};

/// A named event raised by a node.
///
/// # Example
///
/// ```
/// use arbor_types::NodeId;
/// use arbor_widget::Event;
///
/// let source = NodeId::new();
/// let ev = Event::new(source, "changed");
/// assert!(ev.is("changed"));
/// assert_eq!(ev.source, source);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Node that raised the event.
    pub source: NodeId,
    /// Event name as delivered to the listener.
    ///
    /// This is the outward name: if the source's event was renamed,
    /// listeners see the new name here.
    pub name: String,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(source: NodeId, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }

    /// Returns `true` if the event carries the given name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}
