//! The request-driven render cycle.
//!
//! Every render is two walks over the target subtree plus a cleanup step:
//!
//! ```text
//!   write request ──> ingest walk ──> poll walk ──> produce walk ──> purge
//!   read request  ─────────────────> poll walk ──> produce walk ──> purge
//! ```
//!
//! The ingest walk runs only for write requests: each visible node addressed
//! by the submitted fields ingests them exactly once, and its change events
//! are delivered before the walk visits the next node, so by the time the
//! produce walk starts every listener has already reacted. The produce walk is pure: post-order
//! concatenation of children's output handed to the parent's `produce`.
//!
//! Removal requested during dispatch is deferred to the purge step, which
//! runs once, after all output is produced, outside any nested handler.

use std::collections::HashSet;

use arbor_types::NodeId;
use arbor_widget::{FieldView, Method, PageRequest, StyleSink, WidgetError};
use tracing::{debug, warn};

use super::ctx::NodeCtx;
use super::{Tree, TreeError};

impl Tree {
    /// Renders the subtree at the request's path. Write requests ingest
    /// submitted fields first; read requests only poll and produce.
    pub fn render(&mut self, req: &PageRequest) -> Result<String, TreeError> {
        self.render_inner(req, None)
    }

    /// Like [`render`](Self::render), with a style sink. Each widget type's
    /// style hook runs the first time the type produces output.
    pub fn render_styled(
        &mut self,
        req: &PageRequest,
        sink: &mut dyn StyleSink,
    ) -> Result<String, TreeError> {
        self.render_inner(req, Some(sink))
    }

    fn render_inner(
        &mut self,
        req: &PageRequest,
        mut sink: Option<&mut dyn StyleSink>,
    ) -> Result<String, TreeError> {
        let target = self.resolve(&req.path)?;
        debug!(request = %req.id, path = %req.path, method = ?req.method, "render");

        if req.method == Method::Write {
            // One-shot lock: a node ingests at most once per request, even
            // if dispatch restructures the tree mid-walk.
            let mut ingested = HashSet::new();
            self.ingest_walk(target, req, &mut ingested)?;
        }
        self.poll_walk(target)?;

        let mut out = String::new();
        self.produce_walk(target, &mut sink, &mut out)?;

        self.run_purge();
        self.clear_dirty(target);
        Ok(out)
    }

    fn ingest_walk(
        &mut self,
        id: NodeId,
        req: &PageRequest,
        ingested: &mut HashSet<NodeId>,
    ) -> Result<(), TreeError> {
        let Some(slot) = self.slots.get(&id) else {
            return Ok(()); // purged mid-walk
        };
        if !slot.meta.visible {
            // Hidden subtrees never pick up submitted fields.
            return Ok(());
        }
        let path = self.path_of(id);
        if req.addresses(&path) && ingested.insert(id) {
            let Some(mut widget) = self
                .slots
                .get_mut(&id)
                .and_then(|slot| slot.widget.take())
            else {
                warn!(node = %id, path = %path, "widget busy, skipping ingest");
                return Ok(());
            };
            let fields = FieldView::new(&path, &req.fields);
            let (result, queued) = {
                let mut ctx = NodeCtx::buffered(self, id);
                let result = widget.ingest(&mut ctx, &fields);
                (result, ctx.into_queued())
            };
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.widget = Some(widget);
            }
            result.map_err(TreeError::Widget)?;
            // Change events go out now, with the widget back in its
            // slot and before any sibling is visited, so handlers see
            // the ingested state within the same request.
            for name in queued {
                self.fire(id, &name)?;
            }
        }
        let children: Vec<NodeId> = self
            .slots
            .get(&id)
            .map(|slot| slot.meta.children.clone())
            .unwrap_or_default();
        for child in children {
            self.ingest_walk(child, req, ingested)?;
        }
        Ok(())
    }

    /// Runs every widget's poll hook, visible or not: hidden widgets keep
    /// observing external state so they can decide to show themselves.
    fn poll_walk(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.slots.contains_key(&id) {
            return Ok(());
        }
        let Some(mut widget) = self
            .slots
            .get_mut(&id)
            .and_then(|slot| slot.widget.take())
        else {
            return Ok(());
        };
        let (result, queued) = {
            let mut ctx = NodeCtx::buffered(self, id);
            let result = widget.poll(&mut ctx);
            (result, ctx.into_queued())
        };
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.widget = Some(widget);
        }
        result.map_err(TreeError::Widget)?;
        for name in queued {
            self.fire(id, &name)?;
        }

        let children: Vec<NodeId> = self
            .slots
            .get(&id)
            .map(|slot| slot.meta.children.clone())
            .unwrap_or_default();
        for child in children {
            self.poll_walk(child)?;
        }
        Ok(())
    }

    fn produce_walk(
        &mut self,
        id: NodeId,
        sink: &mut Option<&mut dyn StyleSink>,
        out: &mut String,
    ) -> Result<(), TreeError> {
        let Some(slot) = self.slots.get(&id) else {
            return Ok(());
        };
        if !slot.meta.visible {
            return Ok(());
        }
        let children: Vec<NodeId> = slot.meta.children.clone();
        let mut child_out = String::new();
        for child in children {
            self.produce_walk(child, sink, &mut child_out)?;
        }

        let path = self.path_of(id);
        let slot = self
            .slots
            .get(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        let widget = slot.widget.as_ref().ok_or_else(|| {
            TreeError::Widget(WidgetError::Internal(format!(
                "widget busy during produce: {path}"
            )))
        })?;
        if let Some(sink) = sink.as_deref_mut() {
            let type_name = widget.type_name();
            if self.styled_types.insert(type_name) {
                self.slots[&id]
                    .widget
                    .as_ref()
                    .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?
                    .styles(sink);
            }
        }
        let widget = self.slots[&id]
            .widget
            .as_ref()
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        widget.produce(&path, &child_out, out);
        Ok(())
    }

    fn run_purge(&mut self) {
        let queue: Vec<NodeId> = self.purge_queue.drain(..).collect();
        for id in queue {
            if !self.slots.contains_key(&id) {
                continue;
            }
            if let Err(err) = self.remove(id) {
                warn!(node = %id, error = %err, "deferred purge failed");
            }
        }
    }

    fn clear_dirty(&mut self, id: NodeId) {
        let children: Vec<NodeId> = match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.meta.dirty = false;
                slot.meta.children.clone()
            }
            None => return,
        };
        for child in children {
            self.clear_dirty(child);
        }
    }
}
