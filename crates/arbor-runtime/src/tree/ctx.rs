//! Runtime implementation of the widget-facing tree context.
//!
//! A [`NodeCtx`] is built fresh for every handler call, scoped to the node
//! whose widget is currently moved out of its slot. It borrows the whole
//! tree, which is safe precisely because the widget itself is not in the
//! arena while the handler runs.

use arbor_types::NodeId;
use arbor_widget::{TreeCtx, Widget, WidgetError};
use tracing::trace;

use super::{Tree, TreeError};

pub(crate) struct NodeCtx<'t> {
    tree: &'t mut Tree,
    id: NodeId,
    path: String,
    // `Some` while the node's own widget is out of its slot for a
    // lifecycle hook (ingest, poll, update). Fires raised then are
    // held here and dispatched by the caller right after the widget
    // is back, so listeners can observe the firing widget's new state.
    // `None` during `on_event`: dispatch is immediate there, and the
    // empty slot is the cycle break for mutually-triggering handlers.
    queued: Option<Vec<String>>,
}

impl<'t> NodeCtx<'t> {
    pub(crate) fn new(tree: &'t mut Tree, id: NodeId) -> Self {
        let path = tree.path_of(id);
        Self {
            tree,
            id,
            path,
            queued: None,
        }
    }

    pub(crate) fn buffered(tree: &'t mut Tree, id: NodeId) -> Self {
        let path = tree.path_of(id);
        Self {
            tree,
            id,
            path,
            queued: Some(Vec::new()),
        }
    }

    /// Fires held back while the widget was out of its slot. The caller
    /// reinserts the widget, then dispatches these in order.
    pub(crate) fn into_queued(self) -> Vec<String> {
        self.queued.unwrap_or_default()
    }
}

fn widget_err(err: TreeError) -> WidgetError {
    match err {
        TreeError::Widget(inner) => inner,
        other => WidgetError::Internal(other.to_string()),
    }
}

impl TreeCtx for NodeCtx<'_> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn fire(&mut self, name: &str) -> Result<(), WidgetError> {
        let Some(queued) = &mut self.queued else {
            return self.tree.fire(self.id, name).map_err(widget_err);
        };
        // Registration and suppression are judged now, at the call
        // site; only the delivery waits for the slot.
        self.tree.check_registered(self.id, name).map_err(widget_err)?;
        if self.tree.is_suppressed() {
            trace!(source = %self.id, event = name, "suppressed");
            return Ok(());
        }
        queued.push(name.to_string());
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.tree.mark_dirty_up(self.id);
    }

    fn is_suppressed(&self) -> bool {
        self.tree.is_suppressed()
    }

    fn with_suppressed(
        &mut self,
        f: &mut dyn FnMut(&mut dyn TreeCtx) -> Result<(), WidgetError>,
    ) -> Result<(), WidgetError> {
        self.tree.suppress += 1;
        let result = f(self);
        self.tree.suppress -= 1;
        result
    }

    fn set_visible(&mut self, visible: bool) {
        // The node exists for as long as this context does.
        let _ = self.tree.set_visible(self.id, visible);
    }

    fn child_id(&self, name: &str) -> Option<NodeId> {
        self.tree.child_by_name(self.id, name)
    }

    fn child_widget_mut(&mut self, name: &str) -> Option<&mut (dyn Widget + 'static)> {
        let child = self.tree.child_by_name(self.id, name)?;
        self.tree.slots.get_mut(&child)?.widget.as_deref_mut()
    }

    fn update_child(
        &mut self,
        name: &str,
        f: &mut dyn FnMut(&mut dyn Widget, &mut dyn TreeCtx) -> Result<(), WidgetError>,
    ) -> Result<(), WidgetError> {
        let child = self
            .tree
            .child_by_name(self.id, name)
            .ok_or_else(|| WidgetError::Internal(format!("no child named '{name}'")))?;
        let Some(mut widget) = self
            .tree
            .slots
            .get_mut(&child)
            .and_then(|slot| slot.widget.take())
        else {
            return Err(WidgetError::Internal(format!("child '{name}' is busy")));
        };
        let (result, queued) = {
            let mut ctx = NodeCtx::buffered(self.tree, child);
            let result = f(widget.as_mut(), &mut ctx);
            (result, ctx.into_queued())
        };
        if let Some(slot) = self.tree.slots.get_mut(&child) {
            slot.widget = Some(widget);
            slot.meta.dirty = true;
        }
        result?;
        for name in queued {
            self.tree.fire(child, &name).map_err(widget_err)?;
        }
        Ok(())
    }

    fn set_child_visible(&mut self, name: &str, visible: bool) -> Result<(), WidgetError> {
        let child = self
            .tree
            .child_by_name(self.id, name)
            .ok_or_else(|| WidgetError::Internal(format!("no child named '{name}'")))?;
        self.tree.set_visible(child, visible).map_err(widget_err)
    }

    fn purge_child(&mut self, name: &str) {
        if let Some(child) = self.tree.child_by_name(self.id, name) {
            self.tree.purge_queue.push(child);
        }
    }
}
