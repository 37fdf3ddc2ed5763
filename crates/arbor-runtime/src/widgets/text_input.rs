use std::any::Any;

use arbor_widget::{
    DocumentError, FieldView, PropertySet, StyleSink, TreeCtx, Widget, WidgetDocument,
    WidgetError,
};
use serde::{Deserialize, Serialize};

use super::escape;

const DOC_TYPE: &str = "text_input";
const DOC_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct DocState {
    value: String,
}

/// Editable text field.
///
/// Fires `changed` only when an ingested value actually differs from the
/// current one. A value over the length limit becomes validation state on
/// the widget instead of new content; the next valid submission clears it.
///
/// With `echo` off the field renders as a password input and never writes
/// its current value back into the output, and [`save`](Widget::save)
/// refuses to persist the content.
pub struct TextInput {
    value: String,
    echo: bool,
    max_len: Option<usize>,
    validation: Option<String>,
}

impl TextInput {
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: String::new(),
            echo: true,
            max_len: None,
            validation: None,
        }
    }

    /// Masks the field: renders as a password input, never echoes content.
    #[must_use]
    pub fn masked(mut self) -> Self {
        self.echo = false;
        self
    }

    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn echo(&self) -> bool {
        self.echo
    }

    #[must_use]
    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    /// Programmatic edit. Fires `changed` on an actual change, exactly as
    /// an ingested submission would.
    pub fn set_value(
        &mut self,
        ctx: &mut dyn TreeCtx,
        value: impl Into<String>,
    ) -> Result<(), WidgetError> {
        let value = value.into();
        if value == self.value {
            return Ok(());
        }
        self.value = value;
        self.validation = None;
        ctx.mark_dirty();
        ctx.fire("changed")
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TextInput {
    fn type_name(&self) -> &'static str {
        DOC_TYPE
    }

    fn emits(&self) -> &[&'static str] {
        &["changed"]
    }

    fn ingest(
        &mut self,
        ctx: &mut dyn TreeCtx,
        fields: &FieldView<'_>,
    ) -> Result<(), WidgetError> {
        let Some(submitted) = fields.own() else {
            return Ok(());
        };
        if let Some(max) = self.max_len
            && submitted.chars().count() > max
        {
            self.validation = Some(format!("at most {max} characters"));
            ctx.mark_dirty();
            return Ok(());
        }
        if submitted == self.value {
            return Ok(());
        }
        self.value = submitted.to_string();
        self.validation = None;
        ctx.mark_dirty();
        ctx.fire("changed")
    }

    fn produce(&self, path: &str, _children: &str, out: &mut String) {
        out.push_str("<input class=\"arbor-input\" type=\"");
        out.push_str(if self.echo { "text" } else { "password" });
        out.push_str("\" name=\"");
        out.push_str(path);
        out.push_str("\" value=\"");
        if self.echo {
            out.push_str(&escape(&self.value));
        }
        out.push_str("\"/>");
        if let Some(message) = &self.validation {
            out.push_str("<span class=\"arbor-invalid\">");
            out.push_str(&escape(message));
            out.push_str("</span>");
        }
    }

    fn styles(&self, sink: &mut dyn StyleSink) {
        sink.add("arbor-input", &PropertySet::new().with("padding", "0.25em"));
        sink.add("arbor-invalid", &PropertySet::new().with("color", "#b00"));
    }

    fn save(&self) -> Result<WidgetDocument, DocumentError> {
        if !self.echo {
            // Masked content never leaves the widget.
            return Err(DocumentError::NotSupported(DOC_TYPE.to_string()));
        }
        WidgetDocument::from_state(
            DOC_TYPE,
            DOC_VERSION,
            &DocState {
                value: self.value.clone(),
            },
        )
    }

    fn load(&mut self, doc: &WidgetDocument) -> Result<(), DocumentError> {
        self.value.clear();
        self.validation = None;
        doc.check(DOC_TYPE, DOC_VERSION)?;
        let state: DocState = doc.to_state()?;
        self.value = state.value;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;
    use crate::widgets::Panel;
    use arbor_widget::PageRequest;

    fn single_input() -> (Tree, arbor_types::NodeId) {
        let mut tree = Tree::new("root", Box::new(Panel::new()));
        let input = tree.insert("name", Box::new(TextInput::new().with_max_len(8)));
        let root = tree.root();
        tree.adopt(root, input).unwrap();
        (tree, input)
    }

    #[test]
    fn change_is_edge_triggered() {
        let (mut tree, input) = single_input();
        // The default handler errors on delivery, making fires observable.
        tree.subscribe(input, input, "changed").unwrap();

        let req = PageRequest::write("root", [("root.name", "ada")]);
        assert!(tree.render(&req).is_err(), "first change must fire");

        let again = PageRequest::write("root", [("root.name", "ada")]);
        assert!(tree.render(&again).is_ok(), "same value must not fire");
    }

    #[test]
    fn overlong_value_becomes_validation_state() {
        let (mut tree, input) = single_input();
        let req = PageRequest::write("root", [("root.name", "far too long a value")]);
        let out = tree.render(&req).unwrap();

        let widget = tree.widget::<TextInput>(input).unwrap();
        assert_eq!(widget.value(), "", "rejected value must not stick");
        assert!(widget.validation().is_some());
        assert!(out.contains("arbor-invalid"), "{out}");

        // A valid submission clears the message.
        let req = PageRequest::write("root", [("root.name", "ada")]);
        let out = tree.render(&req).unwrap();
        assert!(!out.contains("arbor-invalid"), "{out}");
        assert_eq!(tree.widget::<TextInput>(input).unwrap().value(), "ada");
    }

    #[test]
    fn masked_input_never_echoes_its_value() {
        let mut tree = Tree::new("root", Box::new(Panel::new()));
        let secret = tree.insert("pw", Box::new(TextInput::new().masked()));
        let root = tree.root();
        tree.adopt(root, secret).unwrap();

        let req = PageRequest::write("root", [("root.pw", "hunter2")]);
        let out = tree.render(&req).unwrap();
        assert_eq!(tree.widget::<TextInput>(secret).unwrap().value(), "hunter2");
        assert!(out.contains("type=\"password\""), "{out}");
        assert!(!out.contains("hunter2"), "{out}");
    }

    #[test]
    fn documents_round_trip_and_masked_save_is_refused() {
        let mut plain = TextInput::new();
        plain.value = "ada".to_string();
        let doc = plain.save().unwrap();
        assert_eq!(doc.doc_type, "text_input");
        assert_eq!(doc.version, 1);

        let mut restored = TextInput::new();
        restored.load(&doc).unwrap();
        assert_eq!(restored.value(), "ada");

        let mut masked = TextInput::new().masked();
        masked.value = "hunter2".to_string();
        assert!(masked.save().is_err());
    }

    #[test]
    fn failed_load_clears_to_defaults() {
        let mut input = TextInput::new();
        input.value = "stale".to_string();

        let ahead = WidgetDocument {
            doc_type: "text_input".to_string(),
            version: 99,
            state: serde_json::json!({"value": "future"}),
        };
        assert!(input.load(&ahead).is_err());
        assert_eq!(input.value(), "");
    }
}
