use std::any::Any;

use arbor_types::NodeId;
use arbor_widget::{Event, PropertySet, StyleSink, TreeCtx, Widget, WidgetError};
use tracing::warn;

use super::{Button, TextInput, escape};
use crate::task::{Answer, LogLine, Mode, Outcome, PendingQuestion, TaskController};
use crate::tree::{Tree, TreeError};

/// Operator surface for a [`TaskController`].
///
/// The panel owns the controller and bridges it into the render cycle: its
/// poll hook takes one status snapshot per render, accumulates the log,
/// fires `finished` once when a worker completes, and shows exactly the
/// controls that make sense right now (stop while running, yes/no while a
/// pause confirmation is pending, a masked input while a secret is asked).
///
/// The panel hides itself while idle but keeps polling, so attaching a job
/// makes it appear on the next render without outside help.
///
/// Child nodes, mounted by [`mount`](TaskPanel::mount):
///
/// | Name | Widget | Visible when |
/// |------|--------|--------------|
/// | `stop` | [`Button`] | running |
/// | `force_stop` | [`Button`] | running or stop requested |
/// | `close` | [`Button`] | finished |
/// | `yes` / `no` | [`Button`] | pause confirmation pending |
/// | `answer` | [`TextInput`] | text question pending |
/// | `secret` | [`TextInput`] (masked) | secret question pending |
/// | `submit` | [`Button`] | text or secret question pending |
pub struct TaskPanel {
    controller: TaskController,
    mode: Mode,
    pending: Option<PendingQuestion>,
    outcome: Option<Outcome>,
    log: Vec<LogLine>,
    finished_fired: bool,
}

impl TaskPanel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            controller: TaskController::new(),
            mode: Mode::Idle,
            pending: None,
            outcome: None,
            log: Vec::new(),
            finished_fired: false,
        }
    }

    /// Inserts a panel with its control children under `parent` and wires
    /// the subscriptions. The panel starts hidden; it shows itself once a
    /// job is attached.
    pub fn mount(tree: &mut Tree, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        let panel = tree.insert(name, Box::new(Self::new()));
        tree.adopt(parent, panel)?;

        // Inputs first: ingestion follows adoption order, and a submit
        // click must see the values carried by the same request.
        let answer = tree.insert("answer", Box::new(TextInput::new()));
        tree.adopt(panel, answer)?;
        tree.subscribe(panel, answer, "changed")?;
        let secret = tree.insert("secret", Box::new(TextInput::new().masked()));
        tree.adopt(panel, secret)?;

        for (child, label) in [
            ("yes", "Yes"),
            ("no", "No"),
            ("submit", "Submit"),
            ("stop", "Stop"),
            ("force_stop", "Force stop"),
            ("close", "Close"),
        ] {
            let id = tree.insert(child, Box::new(Button::new(label)));
            tree.adopt(panel, id)?;
            tree.subscribe(panel, id, "clicked")?;
        }

        tree.set_visible(panel, false)?;
        Ok(panel)
    }

    /// The owned controller; jobs are attached through this.
    #[must_use]
    pub fn controller(&self) -> &TaskController {
        &self.controller
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn source_is(ctx: &dyn TreeCtx, name: &str, event: &Event) -> bool {
        ctx.child_id(name) == Some(event.source)
    }

    fn take_child_value(
        ctx: &mut dyn TreeCtx,
        name: &str,
    ) -> Result<String, WidgetError> {
        let value = ctx
            .child_widget_mut(name)
            .and_then(|w| w.as_any_mut().downcast_mut::<TextInput>())
            .map(|input| input.value().to_string())
            .ok_or_else(|| WidgetError::Internal(format!("{name} input missing")))?;
        // Clear the field without re-announcing the edit to listeners.
        ctx.with_suppressed(&mut |ctx| {
            ctx.update_child(name, &mut |w, cctx| {
                let input = w
                    .as_any_mut()
                    .downcast_mut::<TextInput>()
                    .ok_or_else(|| WidgetError::Internal(format!("{name} input missing")))?;
                input.set_value(cctx, "")
            })
        })?;
        Ok(value)
    }
}

impl Default for TaskPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TaskPanel {
    fn type_name(&self) -> &'static str {
        "task_panel"
    }

    fn emits(&self) -> &[&'static str] {
        &["finished"]
    }

    fn poll(&mut self, ctx: &mut dyn TreeCtx) -> Result<(), WidgetError> {
        let snapshot = self.controller.poll();
        let changed = snapshot.mode != self.mode
            || snapshot.pending != self.pending
            || snapshot.outcome != self.outcome
            || !snapshot.lines.is_empty();
        self.log.extend(snapshot.lines);

        if snapshot.mode == Mode::Finished && !self.finished_fired {
            self.finished_fired = true;
            ctx.fire("finished")?;
        }
        if snapshot.mode == Mode::Idle {
            self.finished_fired = false;
            self.log.clear();
        }

        ctx.set_visible(snapshot.mode != Mode::Idle);
        ctx.set_child_visible("stop", snapshot.mode == Mode::Running)?;
        ctx.set_child_visible(
            "force_stop",
            matches!(snapshot.mode, Mode::Running | Mode::StopRequested),
        )?;
        ctx.set_child_visible("close", snapshot.mode == Mode::Finished)?;
        let pause = snapshot.pending.as_ref().is_some_and(PendingQuestion::is_pause);
        let text = snapshot.pending.as_ref().is_some_and(PendingQuestion::is_text);
        let secret = snapshot.pending.as_ref().is_some_and(PendingQuestion::is_secret);
        ctx.set_child_visible("yes", pause)?;
        ctx.set_child_visible("no", pause)?;
        ctx.set_child_visible("answer", text)?;
        ctx.set_child_visible("secret", secret)?;
        ctx.set_child_visible("submit", text || secret)?;

        self.mode = snapshot.mode;
        self.pending = snapshot.pending;
        self.outcome = snapshot.outcome;
        if changed {
            ctx.mark_dirty();
        }
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut dyn TreeCtx, event: &Event) -> Result<(), WidgetError> {
        if event.is("changed") {
            // An answer field edit; nothing to do beyond re-render.
            ctx.mark_dirty();
            return Ok(());
        }
        if !event.is("clicked") {
            return Err(WidgetError::UnexpectedEvent(event.name.clone()));
        }

        // Clicks race against the worker: the mode may have moved since the
        // form was produced. A stale click is the operator's bad luck, not
        // a failure of the request carrying it.
        if Self::source_is(ctx, "stop", event) {
            if let Err(err) = self.controller.graceful_stop() {
                warn!(error = %err, "stale stop click");
            }
        } else if Self::source_is(ctx, "force_stop", event) {
            if let Err(err) = self.controller.forced_stop() {
                warn!(error = %err, "stale force-stop click");
            }
        } else if Self::source_is(ctx, "close", event) {
            match self.controller.close() {
                Ok(()) => self.log.clear(),
                Err(err) => warn!(error = %err, "stale close click"),
            }
        } else if Self::source_is(ctx, "yes", event) || Self::source_is(ctx, "no", event) {
            let yes = Self::source_is(ctx, "yes", event);
            if let Err(err) = self.controller.answer(Answer::Pause(yes)) {
                warn!(error = %err, "stale confirmation click");
            }
        } else if Self::source_is(ctx, "submit", event) {
            match &self.pending {
                Some(PendingQuestion::Text { .. }) => {
                    let value = Self::take_child_value(ctx, "answer")?;
                    if let Err(err) = self.controller.answer(Answer::Text(value)) {
                        warn!(error = %err, "stale answer submit");
                    }
                }
                Some(PendingQuestion::Secret { .. }) => {
                    let value = Self::take_child_value(ctx, "secret")?;
                    if let Err(err) = self.controller.answer(Answer::Secret(value)) {
                        warn!(error = %err, "stale secret submit");
                    }
                }
                _ => warn!("submit click with no pending question"),
            }
        } else {
            return Err(WidgetError::UnexpectedEvent(event.name.clone()));
        }
        ctx.mark_dirty();
        Ok(())
    }

    fn produce(&self, _path: &str, children: &str, out: &mut String) {
        out.push_str("<div class=\"arbor-task\"><p class=\"arbor-task-mode\">");
        out.push_str(self.mode.as_str());
        out.push_str("</p>");
        if let Some(outcome) = &self.outcome {
            out.push_str("<p class=\"arbor-task-outcome\">");
            match outcome {
                Outcome::Completed => out.push_str("completed"),
                Outcome::Cancelled => out.push_str("cancelled"),
                Outcome::Failed(reason) => {
                    out.push_str("failed: ");
                    out.push_str(&escape(reason));
                }
            }
            out.push_str("</p>");
        }
        if !self.log.is_empty() {
            out.push_str("<pre class=\"arbor-task-log\">");
            for entry in &self.log {
                out.push_str(&escape(&entry.line));
                out.push('\n');
            }
            out.push_str("</pre>");
        }
        if let Some(question) = &self.pending {
            out.push_str("<p class=\"arbor-task-prompt\">");
            out.push_str(&escape(question.prompt()));
            out.push_str("</p>");
        }
        out.push_str(children);
        out.push_str("</div>");
    }

    fn styles(&self, sink: &mut dyn StyleSink) {
        sink.add(
            "arbor-task",
            &PropertySet::new().with("border", "1px solid #ccc"),
        );
        sink.add(
            "arbor-task-log",
            &PropertySet::new()
                .with("font-family", "monospace")
                .with("max-height", "12em"),
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
