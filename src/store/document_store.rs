//! Owns every document by id and, when versioning is enabled, a bounded
//! history of its prior `content` field.

use std::collections::HashMap;

use crate::data::{DataValue, Document, VersionEntry};
use crate::error::{Result, SylvanError};
use crate::util::DocIdGenerator;

/// Versioning knobs. Disabled by default.
#[derive(Debug, Clone)]
pub struct VersioningConfig {
    pub enabled: bool,
    pub max_versions: usize,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_versions: 10,
        }
    }
}

/// The authoritative store of documents, keyed by id.
#[derive(Debug)]
pub struct DocumentStore {
    documents: HashMap<String, Document>,
    versioning: VersioningConfig,
    id_generator: DocIdGenerator,
}

impl DocumentStore {
    pub fn new(index_name: impl Into<String>, versioning: VersioningConfig) -> Self {
        Self {
            documents: HashMap::new(),
            versioning,
            id_generator: DocIdGenerator::new(index_name),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Adds `document`, assigning an id if it has none. Stamps
    /// `metadata.indexed` and `metadata.last_modified`.
    pub fn add(&mut self, mut document: Document, now_ms: i64) -> Document {
        if document.id.is_empty() {
            document.id = self.id_generator.next(now_ms);
        }
        document.metadata.insert("indexed".to_string(), DataValue::Int(now_ms));
        document.metadata.insert("last_modified".to_string(), DataValue::Int(now_ms));
        self.documents.insert(document.id.clone(), document.clone());
        document
    }

    /// Replaces the document at `incoming.id`, recording a [`VersionEntry`]
    /// for the prior content if versioning is enabled and the content
    /// actually changed. Errors with [`SylvanError::DocumentNotFound`] if
    /// no document with that id exists.
    pub fn update(&mut self, incoming: Document, now_ms: i64) -> Result<Document> {
        let existing = self
            .documents
            .get(&incoming.id)
            .ok_or_else(|| SylvanError::document_not_found(incoming.id.clone()))?
            .clone();

        let mut updated = incoming;
        updated.versions = existing.versions.clone();

        if self.versioning.enabled && existing.content() != updated.content() {
            updated.versions.push(VersionEntry {
                version: existing.version(),
                content: DataValue::Text(existing.content().to_string()),
                modified: existing.last_modified(),
                author: existing
                    .fields
                    .get("author")
                    .cloned()
                    .unwrap_or(DataValue::Null),
            });
            if updated.versions.len() > self.versioning.max_versions {
                let overflow = updated.versions.len() - self.versioning.max_versions;
                updated.versions.drain(0..overflow);
            }
        }

        updated.set_version(existing.version() + 1);
        updated.metadata = existing.metadata.clone();
        updated
            .metadata
            .insert("last_modified".to_string(), DataValue::Int(now_ms));

        self.documents.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    /// Removes and returns the document at `id`, if any.
    pub fn remove(&mut self, id: &str) -> Option<Document> {
        self.documents.remove(id)
    }

    /// Restores `id`'s content to the content recorded in version
    /// `version`, routed through [`update`](Self::update) so it produces
    /// its own pre-restore version entry and bumps the version counter.
    pub fn restore_version(&mut self, id: &str, version: u64, now_ms: i64) -> Result<Document> {
        let existing = self
            .documents
            .get(id)
            .ok_or_else(|| SylvanError::document_not_found(id.to_string()))?;

        let entry = existing
            .versions
            .iter()
            .find(|v| v.version == version)
            .cloned()
            .ok_or_else(|| {
                SylvanError::invalid_document(format!("document {id} has no version {version}"))
            })?;

        let mut restored = existing.clone();
        restored.fields.insert("content".to_string(), entry.content);
        self.update(restored, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::new().add_text("title", "t").add_text("content", content)
    }

    #[test]
    fn add_assigns_an_id_when_absent() {
        let mut store = DocumentStore::new("catalog", VersioningConfig::default());
        let added = store.add(doc("hello"), 1_000);
        assert!(!added.id.is_empty());
        assert!(store.contains(&added.id));
    }

    #[test]
    fn update_unknown_id_is_an_error() {
        let mut store = DocumentStore::new("catalog", VersioningConfig::default());
        let result = store.update(Document::with_id("missing"), 1_000);
        assert!(matches!(result, Err(SylvanError::DocumentNotFound(_))));
    }

    #[test]
    fn update_bumps_version_and_records_history_when_enabled() {
        let mut store = DocumentStore::new(
            "catalog",
            VersioningConfig {
                enabled: true,
                max_versions: 10,
            },
        );
        let added = store.add(doc("v1"), 1_000);
        let id = added.id.clone();

        let mut next = added.clone();
        next.fields.insert("content".to_string(), DataValue::Text("v2".into()));
        let updated = store.update(next, 2_000).unwrap();

        assert_eq!(updated.version(), 2);
        assert_eq!(updated.versions.len(), 1);
        assert_eq!(updated.versions[0].content, DataValue::Text("v1".into()));
        assert_eq!(store.get(&id).unwrap().content(), "v2");
    }

    #[test]
    fn version_history_is_bounded_by_max_versions() {
        let mut store = DocumentStore::new(
            "catalog",
            VersioningConfig {
                enabled: true,
                max_versions: 2,
            },
        );
        let mut current = store.add(doc("v0"), 1_000);
        for i in 1..=4 {
            current.fields.insert("content".to_string(), DataValue::Text(format!("v{i}")));
            current = store.update(current, 1_000 + i as i64).unwrap();
        }
        assert!(current.versions.len() <= 2);
    }

    #[test]
    fn restore_version_applies_old_content_and_bumps_version_again() {
        let mut store = DocumentStore::new(
            "catalog",
            VersioningConfig {
                enabled: true,
                max_versions: 10,
            },
        );
        let added = store.add(doc("v1"), 1_000);
        let id = added.id.clone();

        let mut next = added.clone();
        next.fields.insert("content".to_string(), DataValue::Text("v2".into()));
        store.update(next, 2_000).unwrap();

        let restored = store.restore_version(&id, 1, 3_000).unwrap();
        assert_eq!(restored.content(), "v1");
        assert_eq!(restored.version(), 3);
    }
}
