//! Widget SDK for the arbor runtime.
//!
//! This crate defines the surface widget authors implement and the
//! message types the render protocol consumes. The tree, event
//! dispatch, render walk and task controller live in `arbor-runtime`;
//! a widget only ever sees the traits declared here.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Layer                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  arbor-types    : NodeId, RequestId, ErrorCode              │
//! │  arbor-widget   : Widget trait, events, requests  ◄── HERE   │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Runtime Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  arbor-runtime  : tree, dispatch, render, task controller    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Pieces
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Widget`] | Tree participant: ingest, poll, produce, on_event |
//! | [`TreeCtx`] | Tree operations available inside a handler |
//! | [`PageRequest`] / [`FieldView`] | Inbound requests, scoped field access |
//! | [`Event`] | Named events between nodes |
//! | [`WidgetDocument`] | Versioned persisted state |
//! | [`StyleSink`] / [`PropertySet`] | Styling collaborator interface |
//!
//! # The Inversion
//!
//! [`TreeCtx`] and [`StyleSink`] are declared here but implemented by
//! the runtime. That keeps this crate free of tree internals while
//! letting widget code fire events, toggle child visibility and
//! register style classes without depending on `arbor-runtime`.
//!
//! # Example
//!
//! ```
//! use arbor_widget::{PageRequest, Method};
//!
//! let req = PageRequest::write("root.form", [("root.form.name", "amy")]);
//! assert_eq!(req.method, Method::Write);
//! assert!(req.addresses("root.form.name"));
//! ```

mod document;
mod error;
mod event;
mod request;
mod style;
mod widget;

pub use document::{DocumentError, WidgetDocument};
pub use error::WidgetError;
pub use event::Event;
pub use request::{FieldView, Method, PageRequest};
pub use style::{PropertySet, StyleSink};
pub use widget::{TreeCtx, Widget};

// Re-export from arbor_types for convenience
pub use arbor_types::{ErrorCode, NodeId, RequestId};
