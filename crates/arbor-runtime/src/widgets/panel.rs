use std::any::Any;

use arbor_widget::Widget;

/// Grouping container: wraps its children's output in a `div`.
pub struct Panel {
    class: String,
}

impl Panel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            class: "arbor-panel".to_string(),
        }
    }

    /// Overrides the CSS class on the wrapper.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Panel {
    fn type_name(&self) -> &'static str {
        "panel"
    }

    fn produce(&self, _path: &str, children: &str, out: &mut String) {
        out.push_str("<div class=\"");
        out.push_str(&self.class);
        out.push_str("\">");
        out.push_str(children);
        out.push_str("</div>");
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
    fn wraps_children_verbatim() {
        let panel = Panel::new().with_class("form");
        let mut out = String::new();
        panel.produce("root", "<span>x</span>", &mut out);
        assert_eq!(out, "<div class=\"form\"><span>x</span></div>");
    }
}
