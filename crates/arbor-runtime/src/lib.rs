//! arbor-runtime: the server-side widget runtime.
//!
//! Ties the SDK layer (`arbor-widget`) to a live system:
//!
//! ```text
//!   PageRequest ──> Tree ── ingest / poll / produce ──> output
//!                    │
//!                    ├── dispatch: named events, synchronous delivery
//!                    ├── widgets: the built-in widget set
//!                    ├── style: write-once class registry
//!                    └── task: background worker control
//! ```
//!
//! A [`Tree`](tree::Tree) holds the widgets of one session. Each incoming
//! [`PageRequest`](arbor_widget::PageRequest) drives one render cycle;
//! everything a widget does happens inside that cycle, on the request's
//! thread. The only concurrency in the crate is the task controller's
//! worker thread, which communicates exclusively through the controller's
//! locked state.

pub mod style;
pub mod task;
pub mod tree;
pub mod widgets;

pub use style::StyleRegistry;
pub use tree::{SuppressScope, Tree, TreeError};
