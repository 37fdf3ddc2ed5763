use std::any::Any;

use arbor_widget::{
    DocumentError, FieldView, PropertySet, StyleSink, TreeCtx, Widget, WidgetDocument,
    WidgetError,
};
use serde::{Deserialize, Serialize};

use super::escape;

const DOC_TYPE: &str = "choice";
const DOC_VERSION: u32 = 2;

/// Version 1 stored the selection as a bare string, empty meaning none.
#[derive(Deserialize)]
struct DocStateV1 {
    selected: String,
}

#[derive(Serialize, Deserialize)]
struct DocStateV2 {
    selected: Option<String>,
}

/// Single selection from a list of keyed options.
///
/// Selection changes are edge-triggered: `selected` fires only when the
/// chosen key actually changes. A submitted key that is not among the
/// options becomes validation state and leaves the selection alone.
pub struct Choice {
    /// (key, label) in presentation order.
    options: Vec<(String, String)>,
    selected: Option<String>,
    validation: Option<String>,
}

impl Choice {
    #[must_use]
    pub fn new<K, V, I>(options: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            options: options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            selected: None,
            validation: None,
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|(k, _)| k == key)
    }

    /// Programmatic selection. `None` clears. Fires `selected` only on an
    /// actual change; an unknown key is rejected as an error here (unlike
    /// ingestion, a programmatic caller has no form to show validation in).
    pub fn select(
        &mut self,
        ctx: &mut dyn TreeCtx,
        key: Option<&str>,
    ) -> Result<(), WidgetError> {
        if let Some(key) = key
            && !self.has_option(key)
        {
            return Err(WidgetError::InvalidField {
                field: ctx.path().to_string(),
                reason: format!("unknown option: {key}"),
            });
        }
        if self.selected.as_deref() == key {
            return Ok(());
        }
        self.selected = key.map(str::to_string);
        self.validation = None;
        ctx.mark_dirty();
        ctx.fire("selected")
    }

    /// Replaces the option list. A selection whose key survives is kept;
    /// otherwise it is cleared, which fires `selected` (the selection did
    /// change). Callers doing a bulk rebuild wrap this in a suppression
    /// scope.
    pub fn repopulate<K, V, I>(
        &mut self,
        ctx: &mut dyn TreeCtx,
        options: I,
    ) -> Result<(), WidgetError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.options = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        ctx.mark_dirty();
        if let Some(current) = self.selected.clone()
            && !self.has_option(&current)
        {
            self.selected = None;
            return ctx.fire("selected");
        }
        Ok(())
    }
}

impl Widget for Choice {
    fn type_name(&self) -> &'static str {
        DOC_TYPE
    }

    fn emits(&self) -> &[&'static str] {
        &["selected"]
    }

    fn ingest(
        &mut self,
        ctx: &mut dyn TreeCtx,
        fields: &FieldView<'_>,
    ) -> Result<(), WidgetError> {
        let Some(submitted) = fields.own() else {
            return Ok(());
        };
        let key = (!submitted.is_empty()).then_some(submitted);
        if let Some(key) = key
            && !self.has_option(key)
        {
            self.validation = Some(format!("unknown option: {key}"));
            ctx.mark_dirty();
            return Ok(());
        }
        if self.selected.as_deref() == key {
            return Ok(());
        }
        self.selected = key.map(str::to_string);
        self.validation = None;
        ctx.mark_dirty();
        ctx.fire("selected")
    }

    fn produce(&self, path: &str, _children: &str, out: &mut String) {
        out.push_str("<select class=\"arbor-choice\" name=\"");
        out.push_str(path);
        out.push_str("\">");
        for (key, label) in &self.options {
            out.push_str("<option value=\"");
            out.push_str(&escape(key));
            if self.selected.as_deref() == Some(key.as_str()) {
                out.push_str("\" selected>");
            } else {
                out.push_str("\">");
            }
            out.push_str(&escape(label));
            out.push_str("</option>");
        }
        out.push_str("</select>");
        if let Some(message) = &self.validation {
            out.push_str("<span class=\"arbor-invalid\">");
            out.push_str(&escape(message));
            out.push_str("</span>");
        }
    }

    fn styles(&self, sink: &mut dyn StyleSink) {
        sink.add("arbor-choice", &PropertySet::new().with("padding", "0.25em"));
    }

    fn save(&self) -> Result<WidgetDocument, DocumentError> {
        WidgetDocument::from_state(
            DOC_TYPE,
            DOC_VERSION,
            &DocStateV2 {
                selected: self.selected.clone(),
            },
        )
    }

    /// Restores the selection. Documents written by the version-1 format
    /// load as well; a restored key no longer among the options clears the
    /// selection instead of inventing an option.
    fn load(&mut self, doc: &WidgetDocument) -> Result<(), DocumentError> {
        self.selected = None;
        self.validation = None;
        doc.check(DOC_TYPE, DOC_VERSION)?;
        let selected = if doc.version == 1 {
            let state: DocStateV1 = doc.to_state()?;
            (!state.selected.is_empty()).then_some(state.selected)
        } else {
            let state: DocStateV2 = doc.to_state()?;
            state.selected
        };
        self.selected = selected.filter(|key| self.has_option(key));
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

    fn color_choice() -> (Tree, arbor_types::NodeId) {
        let mut tree = Tree::new("root", Box::new(Panel::new()));
        let choice = tree.insert(
            "color",
            Box::new(Choice::new([("r", "Red"), ("g", "Green")])),
        );
        let root = tree.root();
        tree.adopt(root, choice).unwrap();
        (tree, choice)
    }

    #[test]
    fn selection_is_edge_triggered() {
        let (mut tree, choice) = color_choice();
        tree.subscribe(choice, choice, "selected").unwrap();

        let req = PageRequest::write("root", [("root.color", "r")]);
        assert!(tree.render(&req).is_err(), "first selection must fire");

        let again = PageRequest::write("root", [("root.color", "r")]);
        assert!(tree.render(&again).is_ok(), "same key must not fire");
    }

    #[test]
    fn unknown_key_becomes_validation_and_keeps_selection() {
        let (mut tree, choice) = color_choice();
        tree.render(&PageRequest::write("root", [("root.color", "g")]))
            .unwrap();

        let out = tree
            .render(&PageRequest::write("root", [("root.color", "mauve")]))
            .unwrap();
        let widget = tree.widget::<Choice>(choice).unwrap();
        assert_eq!(widget.selected(), Some("g"));
        assert!(out.contains("arbor-invalid"), "{out}");
    }

    #[test]
    fn repopulate_keeps_surviving_selection_and_clears_dead_ones() {
        let (mut tree, choice) = color_choice();
        tree.render(&PageRequest::write("root", [("root.color", "g")]))
            .unwrap();
        // The default handler errors on delivery, making fires observable.
        tree.subscribe(choice, choice, "selected").unwrap();

        // Bulk rebuild under suppression: the cleared selection fires
        // nothing outward.
        {
            let mut scope = tree.suppress_events();
            scope
                .update(choice, |c: &mut Choice, ctx| {
                    c.repopulate(ctx, [("b", "Blue"), ("y", "Yellow")])
                })
                .unwrap()
                .unwrap();
        }
        assert_eq!(tree.widget::<Choice>(choice).unwrap().selected(), None);

        tree.render(&PageRequest::write("root", [("root.color", "b")]))
            .unwrap_err(); // fires again: a real change
    }

    #[test]
    fn version_1_documents_still_load() {
        let mut choice = Choice::new([("r", "Red"), ("g", "Green")]);
        let v1 = WidgetDocument {
            doc_type: "choice".to_string(),
            version: 1,
            state: serde_json::json!({"selected": "g"}),
        };
        choice.load(&v1).unwrap();
        assert_eq!(choice.selected(), Some("g"));

        // A key that no longer exists clears rather than lingers.
        let stale = WidgetDocument {
            doc_type: "choice".to_string(),
            version: 2,
            state: serde_json::json!({"selected": "mauve"}),
        };
        choice.load(&stale).unwrap();
        assert_eq!(choice.selected(), None);
    }
}
