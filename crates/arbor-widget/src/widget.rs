//! Widget trait for tree participants.
//!
//! Widgets are the stateful units of the component tree. The runtime
//! owns them in an arena and drives them through this trait: field
//! ingestion on write requests, named-event handling, status polling,
//! and output production.
//!
//! # Render Contract
//!
//! A widget's output must be a pure function of its own state plus the
//! concatenated output of its visible children. The runtime hands the
//! children's output in; [`produce`](Widget::produce) wraps or ignores
//! it but never mutates anything.
//!
//! # Event Contract
//!
//! [`on_event`](Widget::on_event) is called for names the widget
//! subscribed to. The default implementation fails loudly with
//! [`WidgetError::UnexpectedEvent`]: receiving a name the widget does
//! not expect is a wiring bug, and silently ignoring it would hide the
//! bad subscription.
//!
//! # Example
//!
//! ```
//! use arbor_widget::{FieldView, TreeCtx, Widget, WidgetError};
//! use std::any::Any;
//!
//! struct Greeting {
//!     name: String,
//! }
//!
//! impl Widget for Greeting {
//!     fn type_name(&self) -> &'static str {
//!         "greeting"
//!     }
//!
//!     fn emits(&self) -> &[&'static str] {
//!         &["changed"]
//!     }
//!
//!     fn ingest(&mut self, ctx: &mut dyn TreeCtx, fields: &FieldView<'_>) -> Result<(), WidgetError> {
//!         if let Some(value) = fields.own() {
//!             if value != self.name {
//!                 self.name = value.to_string();
//!                 ctx.mark_dirty();
//!                 ctx.fire("changed")?;
//!             }
//!         }
//!         Ok(())
//!     }
//!
//!     fn produce(&self, _path: &str, _children: &str, out: &mut String) {
//!         out.push_str(&format!("<p>hello, {}</p>", self.name));
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//! ```

use crate::{DocumentError, Event, FieldView, StyleSink, WidgetDocument, WidgetError};
use arbor_types::NodeId;
use std::any::Any;

/// A stateful node in the component tree.
///
/// # Required Methods
///
/// | Method | Purpose |
/// |--------|---------|
/// | `type_name` | Stable identifier for styles and documents |
/// | `produce` | Output production (pure) |
/// | `as_any` / `as_any_mut` | Typed access from owner handlers |
///
/// # Optional Methods
///
/// | Method | Default | Purpose |
/// |--------|---------|---------|
/// | `emits` | none | Event names this widget can fire |
/// | `ingest` | no-op | Write-phase field ingestion |
/// | `poll` | no-op | Once-per-render status hook |
/// | `on_event` | fail loudly | Subscribed event handling |
/// | `styles` | no-op | Lazy style-class registration |
/// | `save` / `load` | not supported | Versioned state documents |
pub trait Widget: Send {
    /// Stable type identifier (`"label"`, `"choice"`, ...).
    ///
    /// Used as the style-hook key and the document type tag.
    fn type_name(&self) -> &'static str;

    /// Event names this widget can fire.
    ///
    /// The tree registers these at adoption; subscribing to a name the
    /// source never declared is rejected.
    fn emits(&self) -> &[&'static str] {
        &[]
    }

    /// Ingests submitted fields addressed to this node.
    ///
    /// Called during the write phase, before any sibling or ancestor
    /// renders. The widget must fire its change events through `ctx`
    /// *here*, synchronously, for every actual state change — and fire
    /// nothing when a submitted value equals current state
    /// (edge-triggered delivery).
    ///
    /// Malformed values become validation state on the widget, not an
    /// error; only invariant violations should propagate.
    fn ingest(
        &mut self,
        _ctx: &mut dyn TreeCtx,
        _fields: &FieldView<'_>,
    ) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Once-per-render status hook, run after ingestion and before
    /// output production.
    ///
    /// Widgets bridging external state (the task panel polling its
    /// worker) refresh their display state here. Must not block.
    fn poll(&mut self, _ctx: &mut dyn TreeCtx) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Produces this node's output.
    ///
    /// `children` is the concatenated output of the visible children
    /// in adoption order; the widget wraps it or ignores it. Must not
    /// mutate state — the render walk treats this as pure.
    fn produce(&self, path: &str, children: &str, out: &mut String);

    /// Handles a subscribed event.
    ///
    /// The default fails loudly: an unrecognized name is a programming
    /// error, not something to swallow.
    fn on_event(&mut self, _ctx: &mut dyn TreeCtx, event: &Event) -> Result<(), WidgetError> {
        Err(WidgetError::UnexpectedEvent(event.name.clone()))
    }

    /// Registers this widget type's style classes.
    ///
    /// Called lazily, the first time the type renders; the sink is
    /// write-once per class name.
    fn styles(&self, _sink: &mut dyn StyleSink) {}

    /// Serializes this widget's state into a versioned document.
    ///
    /// # Errors
    ///
    /// Default returns [`DocumentError::NotSupported`].
    fn save(&self) -> Result<WidgetDocument, DocumentError> {
        Err(DocumentError::NotSupported(self.type_name().to_string()))
    }

    /// Restores state from a document.
    ///
    /// A failed load must leave the widget cleared to defaults, never
    /// partially populated.
    ///
    /// # Errors
    ///
    /// Default returns [`DocumentError::NotSupported`].
    fn load(&mut self, _doc: &WidgetDocument) -> Result<(), DocumentError> {
        Err(DocumentError::NotSupported(self.type_name().to_string()))
    }

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Tree operations available to a widget while one of its handlers
/// runs.
///
/// The runtime implements this; widgets only see the trait (the SDK
/// declares the surface, the runtime provides it). The context is
/// scoped to the node whose handler is executing: `fire` fires *from*
/// that node, child accessors resolve against its child list.
pub trait TreeCtx {
    /// The node this context is scoped to.
    fn node_id(&self) -> NodeId;

    /// Full path of this node from the render root.
    fn path(&self) -> &str;

    /// Fires a named event from this node.
    ///
    /// From inside `on_event`, delivery is immediate. From `ingest`,
    /// `poll` or an update closure, delivery happens as soon as this
    /// widget is back in its arena slot — still within the current
    /// lifecycle step, before any sibling is visited — so handlers can
    /// read the firing widget's new state. While a suppression scope
    /// is active the call is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if the name was never registered for this node. A failing
    /// subscriber handler surfaces from this call or from the
    /// enclosing tree operation, depending on when delivery runs.
    fn fire(&mut self, name: &str) -> Result<(), WidgetError>;

    /// Marks this node (and transitively its ancestors) as needing
    /// re-render.
    fn mark_dirty(&mut self);

    /// Returns `true` while a suppression scope is active.
    fn is_suppressed(&self) -> bool;

    /// Runs a bulk update with outward event emission suppressed.
    ///
    /// The suppression is restored when the closure returns, whether
    /// it succeeds or errors, so a failed bulk update cannot leave the
    /// tree mute.
    fn with_suppressed(
        &mut self,
        f: &mut dyn FnMut(&mut dyn TreeCtx) -> Result<(), WidgetError>,
    ) -> Result<(), WidgetError>;

    /// Shows or hides this node's own subtree.
    ///
    /// A node that hides itself stays in the tree and keeps being
    /// polled, so it can decide later to show itself again.
    fn set_visible(&mut self, visible: bool);

    /// Resolves a child by segment name.
    fn child_id(&self, name: &str) -> Option<NodeId>;

    /// Borrows a child's widget for typed access.
    ///
    /// State changed through this borrow fires no events; use
    /// [`update_child`](Self::update_child) when the child's own
    /// setters should be able to fire.
    fn child_widget_mut(&mut self, name: &str) -> Option<&mut (dyn Widget + 'static)>;

    /// Runs a closure against a child widget with a context scoped to
    /// the child, so setters called inside may fire the child's events.
    ///
    /// # Errors
    ///
    /// Fails if no child carries that name, or with whatever the
    /// closure returns.
    fn update_child(
        &mut self,
        name: &str,
        f: &mut dyn FnMut(&mut dyn Widget, &mut dyn TreeCtx) -> Result<(), WidgetError>,
    ) -> Result<(), WidgetError>;

    /// Shows or hides a child subtree.
    ///
    /// # Errors
    ///
    /// Fails if no child carries that name.
    fn set_child_visible(&mut self, name: &str, visible: bool) -> Result<(), WidgetError>;

    /// Schedules a child for removal after the current render pass.
    ///
    /// Removal never happens synchronously inside a handler that the
    /// child itself may have triggered; the purge runs once, outside
    /// all nested dispatch.
    fn purge_child(&mut self, name: &str);
}
