//! Widget tree: single-owner arena of live widgets.
//!
//! The tree owns every widget and all structural metadata (names, parent and
//! child links, visibility, dirty flags). Widgets refer to each other only by
//! [`NodeId`], never by reference, so handlers can freely mutate siblings
//! through the tree without aliasing.
//!
//! ```text
//!   Tree
//!    ├─ slots: NodeId -> { widget, meta }
//!    ├─ subs:  (source, event) -> [listeners]
//!    └─ purge queue, suppression counter, style memo
//! ```
//!
//! Dispatch and render temporarily move a widget out of its slot so the tree
//! itself can be handed to the handler as a [`TreeCtx`](arbor_widget::TreeCtx);
//! the widget is always put back before control returns to the caller.

mod ctx;
mod dispatch;
mod error;
mod render;

pub use dispatch::SuppressScope;
pub use error::TreeError;

use std::collections::{HashMap, HashSet};

use arbor_types::NodeId;
use arbor_widget::Widget;
use tracing::debug;

/// Per-node structural metadata, kept outside the widget so the tree can
/// inspect it while the widget itself is moved out during dispatch.
pub(crate) struct NodeMeta {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) visible: bool,
    pub(crate) dirty: bool,
    /// Raw event names the widget may fire.
    pub(crate) registered: HashSet<String>,
    /// Raw name -> outward name, applied at fire time.
    pub(crate) renames: HashMap<String, String>,
}

impl NodeMeta {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            visible: true,
            dirty: true,
            registered: HashSet::new(),
            renames: HashMap::new(),
        }
    }
}

pub(crate) struct Slot {
    /// `None` while the widget is moved out for a handler call.
    pub(crate) widget: Option<Box<dyn Widget>>,
    pub(crate) meta: NodeMeta,
}

/// The widget tree. See the module docs for the ownership model.
pub struct Tree {
    pub(crate) slots: HashMap<NodeId, Slot>,
    root: NodeId,
    /// (source, delivered name) -> listeners, in subscription order.
    pub(crate) subs: HashMap<(NodeId, String), Vec<NodeId>>,
    /// Nodes queued for removal at the end of the current render.
    pub(crate) purge_queue: Vec<NodeId>,
    /// Event suppression depth. While non-zero, `fire` is a silent no-op.
    pub(crate) suppress: u32,
    /// Widget type names whose style hook has already run.
    pub(crate) styled_types: HashSet<&'static str>,
}

impl Tree {
    /// Creates a tree with the given root widget. The root is always visible
    /// and cannot be removed.
    pub fn new(root_name: &str, root_widget: Box<dyn Widget>) -> Self {
        let root = NodeId::new();
        let mut tree = Self {
            slots: HashMap::new(),
            root,
            subs: HashMap::new(),
            purge_queue: Vec::new(),
            suppress: 0,
            styled_types: HashSet::new(),
        };
        let mut meta = NodeMeta::new(root_name);
        for name in root_widget.emits() {
            meta.registered.insert((*name).to_string());
        }
        tree.slots.insert(
            root,
            Slot {
                widget: Some(root_widget),
                meta,
            },
        );
        tree
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Inserts a widget as a detached node. The node has no parent until
    /// [`adopt`](Self::adopt) links it in; detached subtrees never render.
    ///
    /// The widget's declared event names are registered on insertion.
    pub fn insert(&mut self, name: &str, widget: Box<dyn Widget>) -> NodeId {
        let id = NodeId::new();
        let mut meta = NodeMeta::new(name);
        for event in widget.emits() {
            meta.registered.insert((*event).to_string());
        }
        debug!(node = %id, name, type_name = widget.type_name(), "insert");
        self.slots.insert(
            id,
            Slot {
                widget: Some(widget),
                meta,
            },
        );
        id
    }

    /// Links a detached node under `parent`, appending it to the child order.
    ///
    /// Fails if the child already has a parent, if the link would make a node
    /// its own ancestor, or if a sibling with the same name exists.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.slots.contains_key(&parent) {
            return Err(TreeError::UnknownNode(parent.to_string()));
        }
        let child_meta = &self
            .slots
            .get(&child)
            .ok_or_else(|| TreeError::UnknownNode(child.to_string()))?
            .meta;
        if child_meta.parent.is_some() {
            return Err(TreeError::AlreadyOwned(child_meta.name.clone()));
        }
        let child_name = child_meta.name.clone();
        if self.is_ancestor_of(child, parent) || parent == child {
            return Err(TreeError::Cycle(child_name));
        }
        let parent_meta = &self.meta(parent)?.meta;
        let parent_name = parent_meta.name.clone();
        for sibling in &parent_meta.children {
            if self.slots[sibling].meta.name == child_name {
                return Err(TreeError::DuplicateName {
                    parent: parent_name,
                    name: child_name,
                });
            }
        }
        self.meta_mut(parent)?.meta.children.push(child);
        self.meta_mut(child)?.meta.parent = Some(parent);
        self.mark_dirty_up(parent);
        debug!(parent = %parent, child = %child, name = %child_name, "adopt");
        Ok(())
    }

    /// Unlinks `child` from `parent`, leaving it detached in the arena. The
    /// child keeps its widget, state and subscriptions and can be re-adopted.
    pub fn forsake(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let child_meta = &self
            .slots
            .get(&child)
            .ok_or_else(|| TreeError::UnknownNode(child.to_string()))?
            .meta;
        if child_meta.parent != Some(parent) {
            return Err(TreeError::NotAChild {
                parent: self
                    .slots
                    .get(&parent)
                    .map(|s| s.meta.name.clone())
                    .unwrap_or_else(|| parent.to_string()),
                child: child_meta.name.clone(),
            });
        }
        self.meta_mut(parent)?.meta.children.retain(|c| *c != child);
        self.meta_mut(child)?.meta.parent = None;
        self.mark_dirty_up(parent);
        Ok(())
    }

    /// Drops a node and its whole subtree. Subscriptions from or to any
    /// dropped node are removed. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::Cycle("root".to_string()));
        }
        let meta = &self
            .slots
            .get(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?
            .meta;
        if let Some(parent) = meta.parent {
            self.forsake(parent, id)?;
        }
        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        let doomed_set: HashSet<NodeId> = doomed.iter().copied().collect();
        for node in &doomed {
            self.slots.remove(node);
        }
        self.subs.retain(|(source, _), listeners| {
            if doomed_set.contains(source) {
                return false;
            }
            listeners.retain(|l| !doomed_set.contains(l));
            !listeners.is_empty()
        });
        debug!(node = %id, dropped = doomed.len(), "remove subtree");
        Ok(())
    }

    /// Sets node visibility. Invisible subtrees produce no output and ingest
    /// no submitted fields. Setting the current value is a no-op; a real
    /// change marks the node and its ancestors dirty.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), TreeError> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        if slot.meta.visible == visible {
            return Ok(());
        }
        slot.meta.visible = visible;
        slot.meta.dirty = true;
        if let Some(parent) = slot.meta.parent {
            self.mark_dirty_up(parent);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.slots.get(&id).is_some_and(|s| s.meta.visible)
    }

    /// Whether the node has pending changes for the next render.
    #[must_use]
    pub fn needs_render(&self, id: NodeId) -> bool {
        self.slots.get(&id).is_some_and(|s| s.meta.dirty)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(&id)
            .map(|s| s.meta.children.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.slots.get(&id).map(|s| s.meta.name.as_str())
    }

    /// Dot-separated path from the root, e.g. `"root.form.name"`. Detached
    /// nodes report their path from their own subtree root.
    #[must_use]
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            match self.slots.get(&node) {
                Some(slot) => {
                    segments.push(slot.meta.name.clone());
                    cursor = slot.meta.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        segments.join(".")
    }

    /// Resolves a dot-separated path starting at the root.
    pub fn resolve(&self, path: &str) -> Result<NodeId, TreeError> {
        let mut segments = path.split('.');
        let root_name = segments.next().unwrap_or("");
        if self.slots[&self.root].meta.name != root_name {
            return Err(TreeError::NoSuchPath(path.to_string()));
        }
        let mut cursor = self.root;
        for segment in segments {
            cursor = self
                .child_by_name(cursor, segment)
                .ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
        }
        Ok(cursor)
    }

    #[must_use]
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.slots
            .get(&parent)?
            .meta
            .children
            .iter()
            .copied()
            .find(|c| self.slots[c].meta.name == name)
    }

    /// Borrows the widget at `id` downcast to a concrete type.
    pub fn widget<W: Widget + 'static>(&self, id: NodeId) -> Result<&W, TreeError> {
        let slot = self
            .slots
            .get(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        slot.widget
            .as_ref()
            .and_then(|w| w.as_any().downcast_ref())
            .ok_or_else(|| TreeError::TypeMismatch {
                path: self.path_of(id),
                expected: std::any::type_name::<W>(),
            })
    }

    /// Mutably borrows the widget at `id` downcast to a concrete type. State
    /// changed this way fires no events; use [`update`](Self::update) when the
    /// mutation should be able to fire.
    pub fn widget_mut<W: Widget + 'static>(&mut self, id: NodeId) -> Result<&mut W, TreeError> {
        let path = self.path_of(id);
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        slot.widget
            .as_mut()
            .and_then(|w| w.as_any_mut().downcast_mut())
            .ok_or(TreeError::TypeMismatch {
                path,
                expected: std::any::type_name::<W>(),
            })
    }

    /// Runs a closure against a widget with a context scoped to its node,
    /// so setters called inside can fire the widget's events. The typed
    /// counterpart of dispatch's take-and-put-back discipline.
    pub fn update<W, R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut W, &mut dyn arbor_widget::TreeCtx) -> R,
    ) -> Result<R, TreeError>
    where
        W: Widget + 'static,
    {
        let Some(mut widget) = self.slots.get_mut(&id).and_then(|slot| slot.widget.take())
        else {
            return Err(TreeError::UnknownNode(id.to_string()));
        };
        let (result, queued) = match widget.as_any_mut().downcast_mut::<W>() {
            Some(typed) => {
                let mut ctx = ctx::NodeCtx::buffered(self, id);
                let result = f(typed, &mut ctx);
                (Ok(result), ctx.into_queued())
            }
            None => (
                Err(TreeError::TypeMismatch {
                    path: self.path_of(id),
                    expected: std::any::type_name::<W>(),
                }),
                Vec::new(),
            ),
        };
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.widget = Some(widget);
            slot.meta.dirty = true;
        }
        let result = result?;
        for name in queued {
            self.fire(id, &name)?;
        }
        Ok(result)
    }

    pub(crate) fn meta(&self, id: NodeId) -> Result<&Slot, TreeError> {
        self.slots
            .get(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))
    }

    pub(crate) fn meta_mut(&mut self, id: NodeId) -> Result<&mut Slot, TreeError> {
        self.slots
            .get_mut(&id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))
    }

    /// Marks `id` and every ancestor dirty so the next render re-walks them.
    pub(crate) fn mark_dirty_up(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            match self.slots.get_mut(&node) {
                Some(slot) => {
                    slot.meta.dirty = true;
                    cursor = slot.meta.parent;
                }
                None => break,
            }
        }
    }

    fn is_ancestor_of(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = self.slots.get(&node).and_then(|s| s.meta.parent);
        while let Some(parent) = cursor {
            if parent == candidate {
                return true;
            }
            cursor = self.slots.get(&parent).and_then(|s| s.meta.parent);
        }
        false
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        if let Some(slot) = self.slots.get(&id) {
            for child in &slot.meta.children {
                self.collect_subtree(*child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{Label, Panel};
    use arbor_types::assert_error_code;

    fn sample_tree() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new("root", Box::new(Panel::new()));
        let form = tree.insert("form", Box::new(Panel::new()));
        let title = tree.insert("title", Box::new(Label::new("hello")));
        tree.adopt(tree.root(), form).unwrap();
        tree.adopt(form, title).unwrap();
        (tree, form, title)
    }

    #[test]
    fn paths_follow_adoption_links() {
        let (tree, form, title) = sample_tree();
        assert_eq!(tree.path_of(title), "root.form.title");
        assert_eq!(tree.resolve("root.form").unwrap(), form);
        assert_eq!(tree.resolve("root.form.title").unwrap(), title);
        assert_error_code(
            &tree.resolve("root.nope").unwrap_err(),
            "TREE_NO_SUCH_PATH",
        );
    }

    #[test]
    fn adopt_rejects_owned_nodes_and_cycles() {
        let (mut tree, form, title) = sample_tree();
        let other = tree.insert("other", Box::new(Panel::new()));
        tree.adopt(tree.root(), other).unwrap();

        assert_error_code(&tree.adopt(other, title).unwrap_err(), "TREE_ALREADY_OWNED");
        let root = tree.root();
        assert_error_code(&tree.adopt(title, root).unwrap_err(), "TREE_CYCLE");

        // A forsaken ancestor still cannot be adopted below its descendant.
        tree.forsake(root, form).unwrap();
        assert!(matches!(
            tree.adopt(title, form).unwrap_err(),
            TreeError::Cycle(_)
        ));
    }

    #[test]
    fn adopt_rejects_duplicate_sibling_names() {
        let (mut tree, form, _) = sample_tree();
        let twin = tree.insert("title", Box::new(Label::new("again")));
        assert_error_code(&tree.adopt(form, twin).unwrap_err(), "TREE_DUPLICATE_NAME");
    }

    #[test]
    fn forsaken_nodes_keep_state_and_can_be_readopted() {
        let (mut tree, form, title) = sample_tree();
        tree.forsake(form, title).unwrap();
        assert!(tree.contains(title));
        assert_eq!(tree.resolve("root.form.title").is_err(), true);
        assert_eq!(tree.widget::<Label>(title).unwrap().text(), "hello");

        let root = tree.root();
        tree.adopt(root, title).unwrap();
        assert_eq!(tree.path_of(title), "root.title");
    }

    #[test]
    fn remove_drops_whole_subtree_and_subscriptions() {
        let (mut tree, form, title) = sample_tree();
        let root = tree.root();
        tree.register_event(title, "changed").unwrap();
        tree.subscribe(root, title, "changed").unwrap();

        tree.remove(form).unwrap();
        assert!(!tree.contains(form));
        assert!(!tree.contains(title));
        assert!(tree.subs.is_empty());
    }

    #[test]
    fn root_cannot_be_removed() {
        let (mut tree, _, _) = sample_tree();
        let root = tree.root();
        assert!(tree.remove(root).is_err());
    }

    #[test]
    fn visibility_toggle_marks_ancestors_dirty() {
        let (mut tree, form, title) = sample_tree();
        let root = tree.root();
        // Drain initial dirtiness.
        for id in [root, form, title] {
            tree.meta_mut(id).unwrap().meta.dirty = false;
        }

        tree.set_visible(title, true).unwrap();
        assert!(!tree.needs_render(root), "no-op toggle must not dirty");

        tree.set_visible(title, false).unwrap();
        assert!(tree.needs_render(title));
        assert!(tree.needs_render(form));
        assert!(tree.needs_render(root));
        assert!(!tree.is_visible(title));
    }

    #[test]
    fn widget_downcast_checks_type() {
        let (mut tree, form, title) = sample_tree();
        assert!(tree.widget::<Label>(title).is_ok());
        assert_error_code(
            &tree.widget_mut::<Label>(form).unwrap_err(),
            "TREE_TYPE_MISMATCH",
        );
    }
}
