use std::any::Any;

use arbor_widget::{PropertySet, StyleSink, Widget};

use super::escape;

/// Static text. Output-only: ingests nothing and fires nothing.
#[derive(Debug)]
pub struct Label {
    text: String,
}

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget for Label {
    fn type_name(&self) -> &'static str {
        "label"
    }

    fn produce(&self, _path: &str, _children: &str, out: &mut String) {
        out.push_str("<span class=\"arbor-label\">");
        out.push_str(&escape(&self.text));
        out.push_str("</span>");
    }

    fn styles(&self, sink: &mut dyn StyleSink) {
        sink.add("arbor-label", &PropertySet::new().with("color", "#222"));
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

    #[test]
    fn produce_escapes_text() {
        let label = Label::new("a < b");
        let mut out = String::new();
        label.produce("root.l", "", &mut out);
        assert_eq!(out, "<span class=\"arbor-label\">a &lt; b</span>");
    }
}
