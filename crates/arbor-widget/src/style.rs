//! Styling sink interface.
//!
//! The visual styling subsystem is an external collaborator: widgets
//! hand it named classes with property sets through [`StyleSink`] and
//! never see how the stylesheet string is assembled. Entries are
//! write-once per class name, so the sink is queried for existence
//! before adding.
//!
//! The concrete registry lives in the runtime crate; this trait is the
//! SDK-side surface, implemented there (the same inversion used for
//! [`TreeCtx`](crate::TreeCtx)).

/// An insertion-ordered bag of style properties.
///
/// # Example
///
/// ```
/// use arbor_widget::PropertySet;
///
/// let props = PropertySet::new()
///     .with("display", "block")
///     .with("color", "#333");
/// assert_eq!(props.len(), 2);
/// assert_eq!(props.get("color"), Some("#333"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    props: Vec<(String, String)>,
}

impl PropertySet {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, builder style. Re-setting a name overwrites
    /// the earlier value in place, keeping its position.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds or overwrites a property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.props.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.props.push((name, value));
        }
    }

    /// Returns a property value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Iterates properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Sink that accepts named style classes.
///
/// Write-once-per-key: callers check [`class_exists`](Self::class_exists)
/// and skip the [`add`](Self::add) when the class is already present.
/// The runtime's registry also tolerates a redundant `add` (no-op), so
/// the check is an optimization, not a safety requirement.
pub trait StyleSink {
    /// Returns `true` if a class with this name was already added.
    fn class_exists(&self, name: &str) -> bool;

    /// Adds a class with its property set.
    ///
    /// Adding a name that already exists is a no-op.
    fn add(&mut self, name: &str, props: &PropertySet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_set_builder_order() {
        let props = PropertySet::new()
            .with("a", "1")
            .with("b", "2")
            .with("a", "3");
        // Overwrite keeps position and count.
        assert_eq!(props.len(), 2);
        let collected: Vec<_> = props.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn property_set_get_missing() {
        let props = PropertySet::new();
        assert!(props.is_empty());
        assert_eq!(props.get("x"), None);
    }
}
