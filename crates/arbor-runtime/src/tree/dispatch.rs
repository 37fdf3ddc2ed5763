//! Event registration, subscription and synchronous dispatch.
//!
//! Events are named signals tied to a source node. Delivery is synchronous:
//! `fire` invokes every listener's handler before it returns, in subscription
//! order, so a sibling updated by a handler is already current when the same
//! request goes on to produce output.
//!
//! A node may publish an event under a different outward name via
//! [`rename_event`](Tree::rename_event). Listeners subscribe to the outward
//! name; subscriptions the source holds on itself under the raw name keep
//! working, so a widget's internal wiring survives the rename.

use std::ops::{Deref, DerefMut};

use arbor_types::NodeId;
use arbor_widget::Event;
use tracing::{debug, trace, warn};

use super::ctx::NodeCtx;
use super::{Tree, TreeError};

impl Tree {
    /// Registers an event name on a node. Names declared by the widget's
    /// `emits()` are registered automatically at insertion; this adds names
    /// decided at wiring time. Registering twice is a no-op.
    pub fn register_event(&mut self, id: NodeId, name: &str) -> Result<(), TreeError> {
        self.meta_mut(id)?.meta.registered.insert(name.to_string());
        Ok(())
    }

    /// Publishes `from` under the outward name `to`. From now on listeners
    /// subscribe to `to`; existing self-subscriptions under `from` still
    /// receive the event.
    pub fn rename_event(&mut self, id: NodeId, from: &str, to: &str) -> Result<(), TreeError> {
        let slot = self.meta_mut(id)?;
        if !slot.meta.registered.contains(from) {
            return Err(TreeError::UnregisteredEvent {
                node: slot.meta.name.clone(),
                event: from.to_string(),
            });
        }
        slot.meta
            .renames
            .insert(from.to_string(), to.to_string());
        Ok(())
    }

    /// Subscribes `listener` to `name` fired by `source`. The name must be
    /// registered on the source, or be the outward side of a rename.
    /// Listeners are invoked in subscription order.
    pub fn subscribe(
        &mut self,
        listener: NodeId,
        source: NodeId,
        name: &str,
    ) -> Result<(), TreeError> {
        if !self.slots.contains_key(&listener) {
            return Err(TreeError::UnknownNode(listener.to_string()));
        }
        let meta = &self.meta(source)?.meta;
        let known =
            meta.registered.contains(name) || meta.renames.values().any(|v| v == name);
        if !known {
            return Err(TreeError::UnregisteredEvent {
                node: meta.name.clone(),
                event: name.to_string(),
            });
        }
        self.subs
            .entry((source, name.to_string()))
            .or_default()
            .push(listener);
        Ok(())
    }

    /// Fires `name` from `source`, delivering synchronously to every listener
    /// before returning. While a suppression scope is active the call is a
    /// silent no-op.
    ///
    /// A listener whose widget is currently moved out (its own handler is on
    /// the call stack) is skipped with a warning; this is the cycle break for
    /// mutually-triggering handlers.
    pub fn fire(&mut self, source: NodeId, name: &str) -> Result<(), TreeError> {
        self.check_registered(source, name)?;
        let meta = &self.meta(source)?.meta;
        if self.suppress > 0 {
            trace!(source = %source, event = name, "suppressed");
            return Ok(());
        }
        let outward = meta.renames.get(name).cloned();
        let delivered = outward.as_deref().unwrap_or(name);
        debug!(source = %source, event = delivered, "fire");

        // (listener, name as the listener knows it)
        let mut targets: Vec<(NodeId, String)> = self
            .subs
            .get(&(source, delivered.to_string()))
            .map(|ls| ls.iter().map(|l| (*l, delivered.to_string())).collect())
            .unwrap_or_default();
        if outward.is_some() {
            // Self-subscriptions under the pre-rename name still fire.
            if let Some(raw_listeners) = self.subs.get(&(source, name.to_string())) {
                for l in raw_listeners {
                    if *l == source {
                        targets.push((*l, name.to_string()));
                    }
                }
            }
        }

        for (listener, event_name) in targets {
            let Some(slot) = self.slots.get_mut(&listener) else {
                // Listener was purged by an earlier handler in this round.
                continue;
            };
            let Some(mut widget) = slot.widget.take() else {
                warn!(
                    source = %source,
                    listener = %listener,
                    event = %event_name,
                    "listener busy, skipping delivery"
                );
                continue;
            };
            let event = Event::new(source, &event_name);
            let result = {
                let mut ctx = NodeCtx::new(self, listener);
                widget.on_event(&mut ctx, &event)
            };
            if let Some(slot) = self.slots.get_mut(&listener) {
                slot.widget = Some(widget);
                slot.meta.dirty = true;
            }
            result.map_err(TreeError::Widget)?;
        }
        Ok(())
    }

    pub(crate) fn check_registered(&self, id: NodeId, name: &str) -> Result<(), TreeError> {
        let meta = &self.meta(id)?.meta;
        if !meta.registered.contains(name) {
            return Err(TreeError::UnregisteredEvent {
                node: meta.name.clone(),
                event: name.to_string(),
            });
        }
        Ok(())
    }

    /// Opens an event suppression scope. While the returned guard lives,
    /// every `fire` on this tree is discarded; scopes nest.
    ///
    /// The guard derefs to the tree, so bulk updates run through it:
    ///
    /// ```ignore
    /// let mut scope = tree.suppress_events();
    /// scope.fire(id, "changed")?; // discarded
    /// drop(scope);
    /// ```
    pub fn suppress_events(&mut self) -> SuppressScope<'_> {
        self.suppress += 1;
        SuppressScope { tree: self }
    }

    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppress > 0
    }
}

/// RAII guard for an event suppression scope. Dropping it closes the scope
/// even when the bulk update bails out early with `?`.
pub struct SuppressScope<'t> {
    tree: &'t mut Tree,
}

impl Deref for SuppressScope<'_> {
    type Target = Tree;

    fn deref(&self) -> &Tree {
        self.tree
    }
}

impl DerefMut for SuppressScope<'_> {
    fn deref_mut(&mut self) -> &mut Tree {
        self.tree
    }
}

impl Drop for SuppressScope<'_> {
    fn drop(&mut self) {
        self.tree.suppress -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::Panel;
    use arbor_types::assert_error_code;
    use arbor_widget::{TreeCtx, Widget, WidgetError};

    /// Records every event it sees; optionally fires its own event from the
    /// handler to exercise cascades.
    struct Recorder {
        tag: &'static str,
        seen: Vec<String>,
        cascade: Option<&'static str>,
    }

    impl Recorder {
        fn new(tag: &'static str) -> Self {
            Self {
                tag,
                seen: Vec::new(),
                cascade: None,
            }
        }
    }

    impl Widget for Recorder {
        fn type_name(&self) -> &'static str {
            "recorder"
        }

        fn emits(&self) -> &[&'static str] {
            &["ping"]
        }

        fn on_event(&mut self, ctx: &mut dyn TreeCtx, event: &Event) -> Result<(), WidgetError> {
            self.seen.push(format!("{}:{}", self.tag, event.name));
            if let Some(next) = self.cascade.take() {
                ctx.fire(next)?;
            }
            Ok(())
        }

        fn produce(&self, _path: &str, _children: &str, _out: &mut String) {}

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn wired() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new("root", Box::new(Panel::new()));
        let a = tree.insert("a", Box::new(Recorder::new("a")));
        let b = tree.insert("b", Box::new(Recorder::new("b")));
        let root = tree.root();
        tree.adopt(root, a).unwrap();
        tree.adopt(root, b).unwrap();
        (tree, a, b)
    }

    #[test]
    fn delivery_is_synchronous_and_in_subscription_order() {
        let (mut tree, a, b) = wired();
        tree.subscribe(b, a, "ping").unwrap();
        tree.register_event(a, "pong").unwrap();
        tree.subscribe(b, a, "pong").unwrap();

        tree.fire(a, "ping").unwrap();
        tree.fire(a, "pong").unwrap();
        // Both handlers already ran when fire returned.
        assert_eq!(
            tree.widget::<Recorder>(b).unwrap().seen,
            vec!["b:ping", "b:pong"]
        );
    }

    #[test]
    fn fire_requires_registration() {
        let (mut tree, a, _) = wired();
        assert_error_code(
            &tree.fire(a, "unknown").unwrap_err(),
            "TREE_UNREGISTERED_EVENT",
        );
        assert_error_code(
            &tree.subscribe(a, a, "unknown").unwrap_err(),
            "TREE_UNREGISTERED_EVENT",
        );
    }

    #[test]
    fn suppression_scope_discards_events_and_nests() {
        let (mut tree, a, b) = wired();
        tree.subscribe(b, a, "ping").unwrap();

        {
            let mut scope = tree.suppress_events();
            {
                let mut inner = scope.suppress_events();
                inner.fire(a, "ping").unwrap();
            }
            scope.fire(a, "ping").unwrap();
        }
        assert!(tree.widget::<Recorder>(b).unwrap().seen.is_empty());

        tree.fire(a, "ping").unwrap();
        assert_eq!(tree.widget::<Recorder>(b).unwrap().seen, vec!["b:ping"]);
    }

    #[test]
    fn renamed_event_reaches_outward_subscribers_and_raw_self_subscription() {
        let (mut tree, a, b) = wired();
        tree.rename_event(a, "ping", "a_pinged").unwrap();
        tree.subscribe(b, a, "a_pinged").unwrap();
        // The source's own wiring under the raw name stays intact.
        tree.subscribe(a, a, "ping").unwrap();
        // Non-self raw subscriptions go stale after the rename.
        tree.subscribe(b, a, "ping").unwrap();

        tree.fire(a, "ping").unwrap();
        assert_eq!(tree.widget::<Recorder>(b).unwrap().seen, vec!["b:a_pinged"]);
        assert_eq!(tree.widget::<Recorder>(a).unwrap().seen, vec!["a:ping"]);
    }

    #[test]
    fn self_cascade_is_skipped_with_a_warning() {
        let (mut tree, a, b) = wired();
        // a listens to itself and re-fires from its handler; the second
        // delivery finds a's slot empty and is skipped instead of recursing.
        tree.subscribe(a, a, "ping").unwrap();
        tree.subscribe(b, a, "ping").unwrap();
        tree.widget_mut::<Recorder>(a).unwrap().cascade = Some("ping");

        tree.fire(a, "ping").unwrap();
        let a_seen = &tree.widget::<Recorder>(a).unwrap().seen;
        assert_eq!(a_seen, &vec!["a:ping"]);
        // b hears the original fire and the cascade.
        assert_eq!(
            tree.widget::<Recorder>(b).unwrap().seen,
            vec!["b:ping", "b:ping"]
        );
    }

    #[test]
    fn handler_errors_propagate_after_putting_the_widget_back() {
        struct Failing;
        impl Widget for Failing {
            fn type_name(&self) -> &'static str {
                "failing"
            }
            fn produce(&self, _path: &str, _children: &str, _out: &mut String) {}
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let (mut tree, a, _) = wired();
        let f = tree.insert("f", Box::new(Failing));
        let root = tree.root();
        tree.adopt(root, f).unwrap();
        tree.subscribe(f, a, "ping").unwrap();

        // Failing uses the default handler, which rejects unexpected events.
        let err = tree.fire(a, "ping").unwrap_err();
        assert_error_code(&err, "WIDGET_UNEXPECTED_EVENT");
        // The widget is back in its slot and the tree is still usable.
        assert!(tree.widget::<Failing>(f).is_ok());
    }
}
