//! The key→doc postings map: a secondary, lowercase-token index giving O(1)
//! membership checks without descending the trie.

use std::collections::{HashMap, HashSet};

/// Maps a normalized token to the set of document ids it appears in.
#[derive(Debug, Clone, Default)]
pub struct Postings {
    entries: HashMap<String, HashSet<String>>,
}

impl Postings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `doc_id` contains `key`. No-ops on an empty key or id.
    pub fn map_key(&mut self, key: &str, doc_id: &str) {
        if key.is_empty() || doc_id.is_empty() {
            return;
        }
        self.entries
            .entry(key.to_lowercase())
            .or_default()
            .insert(doc_id.to_string());
    }

    /// The document ids that contain `key`, if any.
    pub fn documents_for(&self, key: &str) -> Option<&HashSet<String>> {
        self.entries.get(&key.to_lowercase())
    }

    /// `true` if `doc_id` is recorded under `key`.
    pub fn contains(&self, key: &str, doc_id: &str) -> bool {
        self.documents_for(key)
            .map(|docs| docs.contains(doc_id))
            .unwrap_or(false)
    }

    /// Removes `doc_id` from every key it was recorded under, dropping keys
    /// left with no documents.
    pub fn remove_document(&mut self, doc_id: &str) {
        self.entries.retain(|_, docs| {
            docs.remove(doc_id);
            !docs.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots the map for persistence (the `data_map` entry of the
    /// persisted blob).
    pub fn to_map(&self) -> HashMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(key, docs)| (key.clone(), docs.iter().cloned().collect()))
            .collect()
    }

    /// Rebuilds a postings map from a snapshot produced by [`to_map`](Self::to_map).
    pub fn from_map(map: HashMap<String, Vec<String>>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(key, docs)| (key, docs.into_iter().collect()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_key_is_case_insensitive() {
        let mut postings = Postings::new();
        postings.map_key("Rust", "doc-1");
        assert!(postings.contains("rust", "doc-1"));
        assert!(postings.contains("RUST", "doc-1"));
    }

    #[test]
    fn remove_document_drops_empty_keys() {
        let mut postings = Postings::new();
        postings.map_key("rust", "doc-1");
        postings.remove_document("doc-1");
        assert!(postings.documents_for("rust").is_none());
    }

    #[test]
    fn remove_document_keeps_other_documents() {
        let mut postings = Postings::new();
        postings.map_key("rust", "doc-1");
        postings.map_key("rust", "doc-2");
        postings.remove_document("doc-1");
        assert!(postings.contains("rust", "doc-2"));
        assert!(!postings.contains("rust", "doc-1"));
    }
}
