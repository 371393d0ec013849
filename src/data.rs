//! The document model shared by the mapper, document store, and engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The value type for a field or metadata entry on a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// An ordered sequence of strings, e.g. `tags`.
    List(Vec<String>),
}

impl DataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            DataValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::Text(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::Text(v.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int(v)
    }
}

impl From<Vec<String>> for DataValue {
    fn from(v: Vec<String>) -> Self {
        DataValue::List(v)
    }
}

/// The kind of directed link a [`Relation`] represents. Opaque to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Reference,
    Parent,
    Child,
    Related,
}

/// A typed directed link between two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source_id: String,
    pub target_id: String,
    pub kind: RelationKind,
}

/// A preserved prior state of a document's content, retained only while
/// versioning is enabled and bounded by `max_versions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: u64,
    pub content: DataValue,
    pub modified: i64,
    pub author: DataValue,
}

/// The unit of indexing.
///
/// `id` is always populated at rest: the Document Store assigns one
/// (`"<index-name>-<ordinal>-<epoch-ms>"`) when a caller omits it. `fields`
/// holds the four required fields (`title`, `content`, `author`, `tags`) plus
/// `version`, and any extra caller-supplied fields are carried as opaque
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: HashMap<String, DataValue>,
    pub metadata: HashMap<String, DataValue>,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Document {
    /// Create a new document with no id (assigned by the Document Store).
    pub fn new() -> Self {
        Self {
            id: String::new(),
            fields: HashMap::new(),
            metadata: HashMap::new(),
            versions: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.id = id.into();
        doc
    }

    pub fn add_field(mut self, name: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn add_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.add_field(name, DataValue::Text(text.into()))
    }

    pub fn add_tags(self, tags: Vec<String>) -> Self {
        self.add_field("tags", DataValue::List(tags))
    }

    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.fields.get(name)
    }

    pub fn title(&self) -> &str {
        self.fields.get("title").and_then(DataValue::as_text).unwrap_or("")
    }

    pub fn content(&self) -> &str {
        self.fields
            .get("content")
            .and_then(DataValue::as_text)
            .unwrap_or("")
    }

    pub fn version(&self) -> u64 {
        self.fields
            .get("version")
            .and_then(DataValue::as_text)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1)
    }

    pub fn set_version(&mut self, version: u64) {
        self.fields
            .insert("version".to_string(), DataValue::Text(version.to_string()));
    }

    pub fn indexed_at(&self) -> i64 {
        self.metadata
            .get("indexed")
            .and_then(DataValue::as_int)
            .unwrap_or(0)
    }

    pub fn last_modified(&self) -> i64 {
        self.metadata
            .get("last_modified")
            .and_then(DataValue::as_int)
            .unwrap_or(0)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reads_back_fields() {
        let doc = Document::with_id("d-1")
            .add_text("title", "Rust Programming")
            .add_text("content", "Learn Rust")
            .add_tags(vec!["lang".into(), "systems".into()]);

        assert_eq!(doc.title(), "Rust Programming");
        assert_eq!(doc.content(), "Learn Rust");
        assert_eq!(
            doc.get("tags").and_then(DataValue::as_list),
            Some(&["lang".to_string(), "systems".to_string()][..])
        );
    }

    #[test]
    fn version_defaults_to_one() {
        let doc = Document::new();
        assert_eq!(doc.version(), 1);
    }
}
