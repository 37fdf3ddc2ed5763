//! Inbound page requests and submitted-field access.
//!
//! A [`PageRequest`] is what the render protocol consumes: a method
//! (read vs write), a path addressing a node in the tree, and a flat
//! `name → value` map of submitted fields.
//!
//! # Field Addressing
//!
//! A node's field names derive from its path: the field addressed to
//! node `root.form.name` is `root.form.name` itself, and compound
//! widgets use dotted suffixes below it (`root.form.name.action`).
//! [`FieldView`] gives a widget a view of exactly its own slice of the
//! submitted map, so it cannot pick up a sibling's data.
//!
//! # Example
//!
//! ```
//! use arbor_widget::{Method, PageRequest};
//!
//! let req = PageRequest::write("root.form", [("root.form.name", "amy")]);
//! assert_eq!(req.method, Method::Write);
//! assert_eq!(req.field("root.form.name"), Some("amy"));
//! assert!(req.field("root.form.other").is_none());
//! ```

use arbor_types::RequestId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request method.
///
/// Only [`Write`](Method::Write) requests carry submitted fields into
/// the ingest phase; [`Read`](Method::Read) requests render without
/// mutating widget state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Render only; submitted fields (if any) are ignored.
    Read,
    /// Ingest submitted fields, then render.
    Write,
}

/// One inbound request against the widget tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Unique id for this request.
    pub id: RequestId,
    /// Read or write.
    pub method: Method,
    /// Path of the node the request is addressed to (dot-separated
    /// segment names, starting at the render root).
    pub path: String,
    /// Flat map of submitted field names to values.
    pub fields: HashMap<String, String>,
}

impl PageRequest {
    /// Creates a read request for the given path.
    #[must_use]
    pub fn read(path: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            method: Method::Read,
            path: path.into(),
            fields: HashMap::new(),
        }
    }

    /// Creates a write request with submitted fields.
    #[must_use]
    pub fn write<K, V, I>(path: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            id: RequestId::new(),
            method: Method::Write,
            path: path.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Adds one submitted field, keeping the method as-is. Mostly useful
    /// for building requests incrementally in tests.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the submitted value for a full field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns `true` if any submitted field is addressed at or below
    /// the given node path.
    #[must_use]
    pub fn addresses(&self, node_path: &str) -> bool {
        self.fields.keys().any(|k| {
            k == node_path
                || (k.len() > node_path.len()
                    && k.starts_with(node_path)
                    && k.as_bytes()[node_path.len()] == b'.')
        })
    }
}

/// A widget's view of the fields addressed to its own node.
///
/// Handed to [`Widget::ingest`](crate::Widget::ingest) by the render
/// walk; the widget sees only values under its own path.
#[derive(Debug)]
pub struct FieldView<'a> {
    path: &'a str,
    fields: &'a HashMap<String, String>,
}

impl<'a> FieldView<'a> {
    /// Creates a view scoped to `path`.
    #[must_use]
    pub fn new(path: &'a str, fields: &'a HashMap<String, String>) -> Self {
        Self { path, fields }
    }

    /// The node path this view is scoped to.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    /// The field submitted under the node's own name, if any.
    #[must_use]
    pub fn own(&self) -> Option<&str> {
        self.fields.get(self.path).map(String::as_str)
    }

    /// A field submitted under a dotted suffix of the node's path.
    #[must_use]
    pub fn sub(&self, suffix: &str) -> Option<&str> {
        self.fields
            .get(&format!("{}.{}", self.path, suffix))
            .map(String::as_str)
    }

    /// Returns `true` if a suffix field is present, regardless of value.
    ///
    /// Buttons use presence, not content.
    #[must_use]
    pub fn has(&self, suffix: &str) -> bool {
        self.sub(suffix).is_some()
    }

    /// Returns `true` if anything at all is addressed to this node.
    #[must_use]
    pub fn any(&self) -> bool {
        self.own().is_some()
            || self.fields.keys().any(|k| {
                k.len() > self.path.len()
                    && k.starts_with(self.path)
                    && k.as_bytes()[self.path.len()] == b'.'
            })
    }
}
