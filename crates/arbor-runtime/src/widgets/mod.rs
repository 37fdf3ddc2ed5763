//! The built-in widget set.
//!
//! | Widget | Purpose |
//! |--------|---------|
//! | [`Label`] | Static text |
//! | [`Panel`] | Grouping container |
//! | [`Button`] | Fires `clicked` on every press |
//! | [`TextInput`] | Editable text, optional masking and length limit |
//! | [`Choice`] | Single selection from keyed options |
//! | [`TaskPanel`] | Operator surface for a [`TaskController`](crate::task::TaskController) |

mod button;
mod choice;
mod label;
mod panel;
mod task_panel;
mod text_input;

pub use button::Button;
pub use choice::Choice;
pub use label::Label;
pub use panel::Panel;
pub use task_panel::TaskPanel;
pub use text_input::TextInput;

/// Minimal HTML escaping for text interpolated into produced output.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
