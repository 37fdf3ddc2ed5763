use std::any::Any;

use arbor_widget::{FieldView, PropertySet, StyleSink, TreeCtx, Widget, WidgetError};

use super::escape;

/// A push button. Every press submitted with a request fires `clicked`;
/// presses carry no state, so there is no level to compare against.
pub struct Button {
    label: String,
}

impl Button {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn type_name(&self) -> &'static str {
        "button"
    }

    fn emits(&self) -> &[&'static str] {
        &["clicked"]
    }

    fn ingest(
        &mut self,
        ctx: &mut dyn TreeCtx,
        fields: &FieldView<'_>,
    ) -> Result<(), WidgetError> {
        if fields.own().is_some() {
            ctx.fire("clicked")?;
        }
        Ok(())
    }

    fn produce(&self, path: &str, _children: &str, out: &mut String) {
        out.push_str("<button type=\"submit\" class=\"arbor-button\" name=\"");
        out.push_str(path);
        out.push_str("\" value=\"1\">");
        out.push_str(&escape(&self.label));
        out.push_str("</button>");
    }

    fn styles(&self, sink: &mut dyn StyleSink) {
        sink.add(
            "arbor-button",
            &PropertySet::new()
                .with("cursor", "pointer")
                .with("padding", "0.25em 1em"),
        );
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

    #[test]
    fn press_fires_clicked_absence_does_not() {
        let mut tree = Tree::new("root", Box::new(Panel::new()));
        let button = tree.insert("go", Box::new(Button::new("Go")));
        let root = tree.root();
        tree.adopt(root, button).unwrap();
        // Subscribing the button to itself lets the default handler report
        // the delivery as an error we can observe.
        tree.subscribe(button, button, "clicked").unwrap();

        let quiet = PageRequest::write("root", [("root.other", "x")]);
        assert!(tree.render(&quiet).is_ok());

        let pressed = PageRequest::write("root", [("root.go", "1")]);
        assert!(tree.render(&pressed).is_err());
    }
}
