//! End-to-end render cycles over a small form: same-request reactions,
//! renamed events, deferred removal, styling and state documents.

use std::any::Any;

use arbor_runtime::style::StyleRegistry;
use arbor_runtime::tree::Tree;
use arbor_runtime::widgets::{Button, Label, Panel, TextInput};
use arbor_types::NodeId;
use arbor_widget::{Event, PageRequest, TreeCtx, Widget, WidgetError};

/// The owning form: greets whoever is typed into `name`, and removes its
/// `row` child when the remove button is pressed.
struct Form {
    reactions: usize,
}

impl Form {
    fn new() -> Self {
        Self { reactions: 0 }
    }
}

impl Widget for Form {
    fn type_name(&self) -> &'static str {
        "form"
    }

    fn on_event(&mut self, ctx: &mut dyn TreeCtx, event: &Event) -> Result<(), WidgetError> {
        if event.is("name_changed") {
            self.reactions += 1;
            let value = ctx
                .child_widget_mut("name")
                .and_then(|w| w.as_any_mut().downcast_mut::<TextInput>())
                .map(|input| input.value().to_string())
                .ok_or_else(|| WidgetError::Internal("name input missing".into()))?;
            let greet = ctx
                .child_widget_mut("greet")
                .and_then(|w| w.as_any_mut().downcast_mut::<Label>())
                .ok_or_else(|| WidgetError::Internal("greet label missing".into()))?;
            greet.set_text(format!("hello, {value}"));
            ctx.mark_dirty();
            Ok(())
        } else if event.is("clicked") {
            ctx.purge_child("row");
            Ok(())
        } else {
            Err(WidgetError::UnexpectedEvent(event.name.clone()))
        }
    }

    fn produce(&self, _path: &str, children: &str, out: &mut String) {
        out.push_str("<form>");
        out.push_str(children);
        out.push_str("</form>");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn form_tree() -> (Tree, NodeId, NodeId) {
    let mut tree = Tree::new("root", Box::new(Form::new()));
    let root = tree.root();

    let name = tree.insert("name", Box::new(TextInput::new()));
    tree.adopt(root, name).unwrap();
    // The form publishes the input's change under a name of its own.
    tree.rename_event(name, "changed", "name_changed").unwrap();
    tree.subscribe(root, name, "name_changed").unwrap();

    let greet = tree.insert("greet", Box::new(Label::new("hello, stranger")));
    tree.adopt(root, greet).unwrap();

    let remove = tree.insert("remove", Box::new(Button::new("Remove")));
    tree.adopt(root, remove).unwrap();
    tree.subscribe(root, remove, "clicked").unwrap();

    let row = tree.insert("row", Box::new(Label::new("row-content")));
    tree.adopt(root, row).unwrap();

    (tree, root, name)
}

#[test]
fn sibling_reacts_within_the_same_request() {
    let (mut tree, _, _) = form_tree();
    let out = tree
        .render(&PageRequest::write("root", [("root.name", "ada")]))
        .unwrap();
    // The greeting already reflects the value submitted with this very
    // request: ingestion fired, the form reacted, then output was produced.
    assert!(out.contains("hello, ada"), "{out}");
}

#[test]
fn resubmitting_the_same_value_fires_nothing() {
    let (mut tree, root, _) = form_tree();
    tree.render(&PageRequest::write("root", [("root.name", "ada")]))
        .unwrap();
    tree.render(&PageRequest::write("root", [("root.name", "ada")]))
        .unwrap();
    assert_eq!(tree.widget::<Form>(root).unwrap().reactions, 1);

    tree.render(&PageRequest::write("root", [("root.name", "grace")]))
        .unwrap();
    assert_eq!(tree.widget::<Form>(root).unwrap().reactions, 2);
}

#[test]
fn renamed_event_is_unreachable_under_its_raw_name() {
    let (mut tree, root, name) = form_tree();
    // Outward subscribers must use the published name; the raw name still
    // exists for the source's own wiring but is stale for others.
    tree.subscribe(root, name, "changed").unwrap();
    tree.render(&PageRequest::write("root", [("root.name", "ada")]))
        .unwrap();
    assert_eq!(tree.widget::<Form>(root).unwrap().reactions, 1);
}

#[test]
fn purge_is_deferred_to_the_end_of_the_render() {
    let (mut tree, _, _) = form_tree();
    let out = tree
        .render(&PageRequest::write("root", [("root.remove", "1")]))
        .unwrap();
    // The removing request still shows the row: output was produced before
    // the purge step ran.
    assert!(out.contains("row-content"), "{out}");
    assert!(tree.resolve("root.row").is_err());

    let out = tree.render(&PageRequest::read("root")).unwrap();
    assert!(!out.contains("row-content"), "{out}");
}

#[test]
fn hidden_subtree_is_inert() {
    let mut tree = Tree::new("root", Box::new(Panel::new()));
    let root = tree.root();
    let section = tree.insert("section", Box::new(Panel::new()));
    tree.adopt(root, section).unwrap();
    let field = tree.insert("field", Box::new(TextInput::new()));
    tree.adopt(section, field).unwrap();

    tree.set_visible(section, false).unwrap();
    let out = tree
        .render(&PageRequest::write("root", [("root.section.field", "stray")]))
        .unwrap();
    assert!(!out.contains("root.section.field"), "{out}");
    assert_eq!(tree.widget::<TextInput>(field).unwrap().value(), "");

    // Shown again, the subtree participates normally.
    tree.set_visible(section, true).unwrap();
    let out = tree
        .render(&PageRequest::write("root", [("root.section.field", "kept")]))
        .unwrap();
    assert!(out.contains("root.section.field"), "{out}");
    assert_eq!(tree.widget::<TextInput>(field).unwrap().value(), "kept");
}

#[test]
fn style_hooks_run_once_per_widget_type() {
    let (mut tree, _, _) = form_tree();
    let mut styles = StyleRegistry::new();
    tree.render_styled(&PageRequest::read("root"), &mut styles)
        .unwrap();
    let first = styles.stylesheet();
    assert!(first.contains(".arbor-input"), "{first}");
    assert!(first.contains(".arbor-label"), "{first}");
    assert!(first.contains(".arbor-button"), "{first}");

    // Re-rendering adds nothing: the hook is once per type, and the
    // registry is write-once per class anyway.
    tree.render_styled(&PageRequest::read("root"), &mut styles)
        .unwrap();
    assert_eq!(styles.stylesheet(), first);
}

#[test]
fn widget_documents_move_state_between_trees() {
    let (mut tree, _, name) = form_tree();
    tree.render(&PageRequest::write("root", [("root.name", "ada")]))
        .unwrap();
    let doc = tree.widget::<TextInput>(name).unwrap().save().unwrap();

    let (mut other, _, other_name) = form_tree();
    other
        .widget_mut::<TextInput>(other_name)
        .unwrap()
        .load(&doc)
        .unwrap();
    assert_eq!(other.widget::<TextInput>(other_name).unwrap().value(), "ada");
}
