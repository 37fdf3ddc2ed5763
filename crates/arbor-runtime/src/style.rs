//! Write-once style class registry.
//!
//! Collects the classes widget types declare through their style hooks and
//! serializes them as one stylesheet. A class name is write-once: the first
//! registration wins and later attempts are ignored, so a widget type
//! rendered in many trees against the same registry contributes its classes
//! exactly once.

use std::collections::HashSet;

use arbor_widget::{PropertySet, StyleSink};
use tracing::trace;

#[derive(Default)]
pub struct StyleRegistry {
    // Insertion order is stylesheet order.
    classes: Vec<(String, PropertySet)>,
    index: HashSet<String>,
}

impl StyleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertySet> {
        self.classes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, props)| props)
    }

    /// Serializes every registered class, in registration order.
    #[must_use]
    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        for (name, props) in &self.classes {
            out.push('.');
            out.push_str(name);
            out.push('{');
            for (key, value) in props.iter() {
                out.push_str(key);
                out.push(':');
                out.push_str(value);
                out.push(';');
            }
            out.push_str("}\n");
        }
        out
    }
}

impl StyleSink for StyleRegistry {
    fn class_exists(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    fn add(&mut self, name: &str, props: &PropertySet) {
        if !self.index.insert(name.to_string()) {
            trace!(class = name, "style class already registered");
            return;
        }
        self.classes.push((name.to_string(), props.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins() {
        let mut reg = StyleRegistry::new();
        reg.add("arbor-label", &PropertySet::new().with("color", "#222"));
        reg.add("arbor-label", &PropertySet::new().with("color", "#f00"));

        assert_eq!(reg.len(), 1);
        assert!(reg.class_exists("arbor-label"));
        assert_eq!(reg.get("arbor-label").unwrap().get("color"), Some("#222"));
    }

    #[test]
    fn stylesheet_preserves_registration_and_property_order() {
        let mut reg = StyleRegistry::new();
        reg.add(
            "a",
            &PropertySet::new().with("margin", "0").with("padding", "1em"),
        );
        reg.add("b", &PropertySet::new().with("color", "#222"));

        assert_eq!(reg.stylesheet(), ".a{margin:0;padding:1em;}\n.b{color:#222;}\n");
    }
}
