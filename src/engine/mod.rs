//! The engine façade: the single entry point embedders use. Owns the
//! trie/postings/mapper, the document store, the result cache, and the
//! storage and event collaborators, and drives them all through a small
//! state machine.
//!
//! ```text
//! Uninitialized -> Initialized -> (Initialized | Mutating | Searching)* -> Closed
//! ```
//!
//! Every operation but `initialize`/`import_index`/`export_index`/`close`
//! only touches in-memory structures; suspension only happens at the
//! storage boundary those four calls cross.

pub mod config;
pub mod search;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use config::{SearchOptions, SearchOptionsBuilder, SortBy, SortOrder};
pub use search::SearchResult;

use crate::data::Document;
use crate::error::{Result, SylvanError};
use crate::events::{Event, EventSink, NullSink};
use crate::index::mapper::{Hit, IndexMapper, MatchMode};
use crate::index::postings::Postings;
use crate::index::traversal::{self, TraversalConfig};
use crate::index::trie::{ScoreContext, Trie, TrieBlob, TrieConfig};
use crate::query;
use crate::cache::{Cache, CacheKey, CacheStrategy};
use crate::storage::Storage;
use crate::store::{DocumentStore, VersioningConfig};
use crate::util::now_ms;

/// The current persisted blob shape. Bumped whenever the shape changes in
/// a way a prior build cannot read.
const BLOB_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Initialized,
    Mutating,
    Searching,
    Closed,
}

/// A coarse snapshot of engine size, handed back by [`Engine::get_stats`].
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub document_count: usize,
    pub indexed_term_count: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndexState {
    trie: TrieBlob,
    data_map: HashMap<String, Vec<String>>,
    documents: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedConfig {
    name: String,
    version: u32,
    fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedBlob {
    documents: Vec<Document>,
    index_state: PersistedIndexState,
    config: PersistedConfig,
}

/// Builds an [`Engine`], matching the rest of the crate's consuming-builder
/// convention.
pub struct EngineBuilder {
    name: String,
    trie_config: TrieConfig,
    versioning: VersioningConfig,
    cache_max_size: usize,
    cache_ttl: std::time::Duration,
    cache_strategy: CacheStrategy,
    storage: Option<Arc<dyn Storage>>,
    events: Option<Arc<dyn EventSink>>,
}

impl EngineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trie_config: TrieConfig::default(),
            versioning: VersioningConfig::default(),
            cache_max_size: 1000,
            cache_ttl: std::time::Duration::from_secs(5 * 60),
            cache_strategy: CacheStrategy::default(),
            storage: None,
            events: None,
        }
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.trie_config.case_sensitive = enabled;
        self
    }

    pub fn max_word_length(mut self, max: usize) -> Self {
        self.trie_config.max_word_length = max;
        self
    }

    pub fn versioning(mut self, enabled: bool, max_versions: usize) -> Self {
        self.versioning = VersioningConfig { enabled, max_versions };
        self
    }

    pub fn cache(mut self, max_size: usize, ttl: std::time::Duration) -> Self {
        self.cache_max_size = max_size;
        self.cache_ttl = ttl;
        self
    }

    pub fn cache_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.cache_strategy = strategy;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            store: parking_lot::RwLock::new(DocumentStore::new(self.name.clone(), self.versioning.clone())),
            mapper: parking_lot::RwLock::new(IndexMapper::new(self.trie_config.clone())),
            state: parking_lot::RwLock::new(EngineState::Uninitialized),
            cache: parking_lot::Mutex::new(Cache::with_strategy(self.cache_max_size, self.cache_ttl, self.cache_strategy)),
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(crate::storage::MemoryStorage::new())),
            events: self.events.unwrap_or_else(|| Arc::new(NullSink)),
            trie_config: self.trie_config,
            versioning: self.versioning,
            name: self.name,
        }
    }
}

/// The embeddable search engine.
pub struct Engine {
    name: String,
    state: parking_lot::RwLock<EngineState>,
    mapper: parking_lot::RwLock<IndexMapper>,
    store: parking_lot::RwLock<DocumentStore>,
    cache: parking_lot::Mutex<Cache>,
    storage: Arc<dyn Storage>,
    events: Arc<dyn EventSink>,
    trie_config: TrieConfig,
    versioning: VersioningConfig,
}

impl Engine {
    pub fn builder(name: impl Into<String>) -> EngineBuilder {
        EngineBuilder::new(name)
    }

    fn persistence_key(&self) -> String {
        format!("sylvan:index:{}", self.name)
    }

    fn begin(&self, next: EngineState) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            EngineState::Initialized => {
                *state = next;
                Ok(())
            }
            EngineState::Uninitialized => Err(SylvanError::internal("engine has not been initialized")),
            EngineState::Closed => Err(SylvanError::internal("engine is closed")),
            EngineState::Mutating | EngineState::Searching => {
                Err(SylvanError::internal("engine is busy with another operation"))
            }
        }
    }

    fn end(&self) {
        *self.state.write() = EngineState::Initialized;
    }

    fn emit(&self, event: Event) {
        self.events.emit(event);
    }

    /// Recovers state from storage if a prior blob exists, then transitions
    /// to `Initialized`. Safe to call exactly once.
    pub async fn initialize(&self) -> Result<()> {
        {
            let state = self.state.read();
            if *state != EngineState::Uninitialized {
                return Err(SylvanError::internal("engine has already been initialized"));
            }
        }

        let loaded = self
            .storage
            .get(&self.persistence_key())
            .await
            .map_err(|e| SylvanError::storage_unavailable(e.to_string()))?;

        if let Some(bytes) = loaded {
            self.restore_from_bytes(&bytes)?;
        }

        *self.state.write() = EngineState::Initialized;
        self.emit(Event::ok("engine:initialized", now_ms(), ()));
        Ok(())
    }

    /// Adds `document`, assigning an id if absent. Invalidates the cache.
    pub async fn add_document(&self, document: Document) -> Result<Document> {
        self.begin(EngineState::Mutating)?;
        self.emit(Event::ok("index:start", now_ms(), ()));

        let now = now_ms();
        let added = self.store.write().add(document, now);
        self.mapper.write().index_document(&added, now);
        self.cache.lock().clear();

        self.end();
        self.emit(Event::ok("index:complete", now_ms(), added.id.clone()));
        Ok(added)
    }

    /// Adds every document in `documents` in order, emitting
    /// `bulk:update:*` instead of one `index:*` event per document.
    pub async fn add_many(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        self.begin(EngineState::Mutating)?;
        self.emit(Event::ok("bulk:update:start", now_ms(), documents.len()));

        let now = now_ms();
        let mut added = Vec::with_capacity(documents.len());
        for document in documents {
            let stored = self.store.write().add(document, now);
            self.mapper.write().index_document(&stored, now);
            added.push(stored);
        }
        self.cache.lock().clear();

        self.end();
        self.emit(Event::ok("bulk:update:complete", now_ms(), added.len()));
        Ok(added)
    }

    /// Replaces the document at `document.id`. Errors with
    /// [`SylvanError::DocumentNotFound`] if that id is not present.
    pub async fn update_document(&self, document: Document) -> Result<Document> {
        self.begin(EngineState::Mutating)?;
        self.emit(Event::ok("update:start", now_ms(), document.id.clone()));

        let now = now_ms();
        let result = self.store.write().update(document, now);
        let updated = match result {
            Ok(doc) => doc,
            Err(e) => {
                self.end();
                self.emit(Event::err("update:error", now_ms(), &e));
                return Err(e);
            }
        };
        self.mapper.write().update_document(&updated, now);
        self.cache.lock().clear();

        self.end();
        self.emit(Event::ok("update:complete", now_ms(), updated.id.clone()));
        Ok(updated)
    }

    /// Removes the document at `id`. Errors with
    /// [`SylvanError::DocumentNotFound`] if it was never present.
    pub async fn remove_document(&self, id: &str) -> Result<()> {
        self.begin(EngineState::Mutating)?;
        self.emit(Event::ok("remove:start", now_ms(), id));

        let removed = self.store.write().remove(id);
        if removed.is_none() {
            self.end();
            let err = SylvanError::document_not_found(id.to_string());
            self.emit(Event::err("remove:error", now_ms(), &err));
            return Err(err);
        }
        self.mapper.write().remove_document(id);
        self.cache.lock().clear();

        self.end();
        self.emit(Event::ok("remove:complete", now_ms(), id));
        Ok(())
    }

    /// Restores `id`'s content to a prior version, routed through
    /// `update_document` so it participates in the usual versioning and
    /// cache-invalidation path.
    pub async fn restore_version(&self, id: &str, version: u64) -> Result<Document> {
        self.begin(EngineState::Mutating)?;
        let now = now_ms();
        let result = self.store.write().restore_version(id, version, now);
        let restored = match result {
            Ok(doc) => doc,
            Err(e) => {
                self.end();
                return Err(e);
            }
        };
        self.mapper.write().update_document(&restored, now);
        self.cache.lock().clear();
        self.end();
        Ok(restored)
    }

    fn fingerprint(options: &SearchOptions) -> String {
        // HashMap's Debug order isn't stable across runs, so boost entries
        // are sorted first; otherwise two calls with an identical boost map
        // could mint different cache keys.
        let mut boost: Vec<(&String, &f64)> = options.boost.iter().collect();
        boost.sort_by(|a, b| a.0.cmp(b.0));

        format!(
            "{}|{}|{}|{:?}|{:?}|{}|{}|{}|{:?}|{:?}|{}|{}|{:?}|{}|{}",
            options.fuzzy,
            options.max_distance,
            options.prefix_match,
            options.fields,
            boost,
            options.max_results,
            options.threshold,
            options.min_score,
            options.sort_by,
            options.sort_order,
            options.page,
            options.page_size,
            options.regex,
            options.case_sensitive,
            options.include_matches,
        )
    }

    /// Runs `query` against the index under `options`, returning a page of
    /// ranked, scored results.
    pub async fn search(&self, query_text: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        options.validate()?;
        self.begin(EngineState::Searching)?;
        self.emit(Event::ok("search:start", now_ms(), query_text));

        let result = self.search_inner(query_text, options);

        self.end();
        match &result {
            Ok(hits) => self.emit(Event::ok("search:complete", now_ms(), hits.len())),
            Err(e) => self.emit(Event::err("search:error", now_ms(), e)),
        }
        result
    }

    fn search_inner(&self, query_text: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let cache_key: CacheKey = (query_text.to_string(), Self::fingerprint(options));
        if let Some(cached) = self.cache.lock().get(&cache_key) {
            return self.hits_to_results(cached, options);
        }

        let ctx = ScoreContext::new(self.store.read().len(), now_ms());
        let mapper = self.mapper.read();

        let mut hits = if let Some(pattern) = &options.regex {
            let traversal_config = TraversalConfig {
                case_sensitive: options.case_sensitive,
                ..options.regex_config.clone()
            };
            // Field-scoped trie entries are stored as "field:token", so a
            // field-restricted regex runs once per field with that prefix
            // spliced onto the pattern instead of against the plain token.
            let scoped_patterns: Vec<String> = if options.fields.is_empty() {
                vec![pattern.clone()]
            } else {
                options.fields.iter().map(|field| format!("{field}:{pattern}")).collect()
            };
            let mut merged = Vec::new();
            for scoped in &scoped_patterns {
                merged.extend(traversal::traverse(mapper.trie(), scoped, &traversal_config, &ctx)?);
            }
            merged
                .into_iter()
                .map(|hit| Hit { doc_id: hit.doc_id, score: hit.score, matches: hit.matched_text })
                .collect()
        } else {
            let processed = query::process(query_text);
            let mut positive_terms = Vec::new();
            let mut excluded_terms = Vec::new();
            for token in &processed.tokens {
                match token {
                    query::Token::Term(w) => positive_terms.push(w.clone()),
                    query::Token::Required(w) => positive_terms.push(w.clone()),
                    query::Token::Excluded(w) => excluded_terms.push(w.clone()),
                    query::Token::Phrase(p) => positive_terms.extend(p.split_whitespace().map(str::to_string)),
                    query::Token::And | query::Token::Or | query::Token::Not => {}
                }
            }
            if positive_terms.is_empty() {
                Vec::new()
            } else {
                let mode = if options.fuzzy {
                    MatchMode::Fuzzy { max_distance: options.max_distance }
                } else if options.prefix_match {
                    MatchMode::Prefix
                } else {
                    MatchMode::Exact
                };
                let fetch_cap = (options.page * options.page_size).max(options.max_results);
                let mut hits = mapper.search(&positive_terms, mode, fetch_cap, &options.fields, &options.boost, &ctx)?;
                if !excluded_terms.is_empty() {
                    let no_boost = HashMap::new();
                    let excluded =
                        mapper.search(&excluded_terms, MatchMode::Exact, usize::MAX, &options.fields, &no_boost, &ctx)?;
                    let excluded_ids: std::collections::HashSet<_> = excluded.into_iter().map(|h| h.doc_id).collect();
                    hits.retain(|h| !excluded_ids.contains(&h.doc_id));
                }
                hits
            }
        };

        let max_score = hits.iter().map(|h| h.score).fold(0.0_f64, f64::max);
        hits.retain(|h| {
            h.score >= options.min_score && (max_score == 0.0 || h.score / max_score >= options.threshold)
        });

        sort_hits(&mut hits, options);

        let start = (options.page - 1) * options.page_size;
        let page: Vec<Hit> = hits.into_iter().skip(start).take(options.page_size).collect();

        self.cache.lock().set(cache_key, page.clone());
        self.hits_to_results(page, options)
    }

    fn hits_to_results(&self, hits: Vec<Hit>, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let store = self.store.read();
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let document = store.get(&hit.doc_id)?.clone();
                let matches = if options.include_matches { Some(hit.matches) } else { None };
                Some(SearchResult {
                    id: hit.doc_id,
                    score: hit.score,
                    document,
                    matches,
                })
            })
            .collect())
    }

    /// Drops every document and rebuilds an empty index.
    pub async fn clear_index(&self) -> Result<()> {
        self.begin(EngineState::Mutating)?;
        *self.store.write() = DocumentStore::new(self.name.clone(), self.versioning.clone());
        *self.mapper.write() = IndexMapper::new(self.trie_config.clone());
        self.cache.lock().clear();
        self.end();
        self.emit(Event::ok("index:clear", now_ms(), ()));
        Ok(())
    }

    /// Serializes the entire engine state to the persisted blob shape.
    pub fn export_index(&self) -> Result<Vec<u8>> {
        let store = self.store.read();
        let mapper = self.mapper.read();
        let documents: Vec<Document> = store.iter().cloned().collect();
        let blob = PersistedBlob {
            index_state: PersistedIndexState {
                trie: mapper.trie().to_blob(),
                data_map: mapper.postings().to_map(),
                documents: documents.iter().map(|d| d.id.clone()).collect(),
            },
            config: PersistedConfig {
                name: self.name.clone(),
                version: BLOB_VERSION,
                fields: Vec::new(),
            },
            documents,
        };
        serde_json::to_vec(&blob).map_err(|e| SylvanError::internal(e.to_string()))
    }

    /// Replaces the entire engine state from a blob previously produced by
    /// [`export_index`](Self::export_index). Errors with
    /// [`SylvanError::SerializationMismatch`] if the blob's version doesn't
    /// match this build's.
    pub async fn import_index(&self, bytes: &[u8]) -> Result<()> {
        self.begin(EngineState::Mutating)?;
        self.emit(Event::ok("import:start", now_ms(), ()));
        let result = self.restore_from_bytes(bytes);
        self.end();
        match &result {
            Ok(()) => self.emit(Event::ok("import:complete", now_ms(), ())),
            Err(e) => self.emit(Event::err("import:error", now_ms(), e)),
        }
        result
    }

    fn restore_from_bytes(&self, bytes: &[u8]) -> Result<()> {
        let blob: PersistedBlob =
            serde_json::from_slice(bytes).map_err(|e| SylvanError::serialization_mismatch(e.to_string()))?;
        if blob.config.version != BLOB_VERSION {
            return Err(SylvanError::serialization_mismatch(format!(
                "blob version {} does not match engine version {BLOB_VERSION}",
                blob.config.version
            )));
        }

        let now = now_ms();
        let trie = Trie::from_blob(blob.index_state.trie, self.trie_config.clone(), now)?;
        let postings = Postings::from_map(blob.index_state.data_map);

        let mut store = DocumentStore::new(blob.config.name.clone(), self.versioning.clone());
        for document in blob.documents {
            store.add(document, now);
        }

        *self.store.write() = store;
        *self.mapper.write() = IndexMapper::from_parts(trie, postings);
        self.cache.lock().clear();
        Ok(())
    }

    /// Rebuilds the trie and postings map from the document store, in case
    /// they ever drift from it.
    pub async fn reindex(&self) -> Result<()> {
        self.begin(EngineState::Mutating)?;
        self.emit(Event::ok("reindex:start", now_ms(), ()));

        let now = now_ms();
        let mut mapper = IndexMapper::new(self.trie_config.clone());
        for document in self.store.read().iter() {
            mapper.index_document(document, now);
        }
        *self.mapper.write() = mapper;
        self.cache.lock().clear();

        self.end();
        self.emit(Event::ok("reindex:complete", now_ms(), ()));
        Ok(())
    }

    /// Currently equivalent to [`reindex`](Self::reindex): a full rebuild
    /// is the only compaction this engine needs, since removal already
    /// prunes dead trie branches eagerly.
    pub async fn optimize(&self) -> Result<()> {
        self.emit(Event::ok("optimize:start", now_ms(), ()));
        let result = self.reindex().await;
        match &result {
            Ok(()) => self.emit(Event::ok("optimize:complete", now_ms(), ())),
            Err(e) => self.emit(Event::err("optimize:error", now_ms(), e)),
        }
        result
    }

    pub fn get_stats(&self) -> EngineStats {
        let cache = self.cache.lock();
        let stats = cache.stats();
        EngineStats {
            document_count: self.store.read().len(),
            indexed_term_count: self.mapper.read().postings().len(),
            cache_hits: stats.hits,
            cache_misses: stats.misses,
            cache_hit_rate: stats.hit_rate(),
        }
    }

    /// Flushes the current state to storage and closes it. Transitions the
    /// engine to `Closed`; every other call after this returns an error.
    pub async fn close(&self) -> Result<()> {
        self.begin(EngineState::Mutating)?;
        let bytes = self.export_index()?;
        let persisted = self
            .storage
            .put(&self.persistence_key(), bytes)
            .await
            .map_err(|e| SylvanError::storage_error(e.to_string()));
        if let Err(e) = persisted {
            *self.state.write() = EngineState::Initialized;
            self.emit(Event::err("storage:error", now_ms(), &e));
            return Err(e);
        }
        self.storage
            .close()
            .await
            .map_err(|e| SylvanError::storage_error(e.to_string()))?;
        *self.state.write() = EngineState::Closed;
        self.emit(Event::ok("engine:closed", now_ms(), ()));
        Ok(())
    }
}

fn sort_hits(hits: &mut [Hit], options: &SearchOptions) {
    match &options.sort_by {
        SortBy::Score => hits.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal)),
        SortBy::Field(_) => hits.sort_by(|a, b| a.doc_id.cmp(&b.doc_id)),
    }
    if options.sort_order == SortOrder::Descending {
        hits.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    fn sample_doc(title: &str, content: &str) -> Document {
        Document::new().add_text("title", title).add_text("content", content)
    }

    #[tokio::test]
    async fn initialize_add_and_search_round_trip() {
        let engine = Engine::builder("catalog").build();
        engine.initialize().await.unwrap();
        engine.add_document(sample_doc("Rust Programming", "Learn systems code")).await.unwrap();

        let results = engine.search("rust", &SearchOptions::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.title(), "Rust Programming");
    }

    #[tokio::test]
    async fn search_before_initialize_is_an_error() {
        let engine = Engine::builder("catalog").build();
        let result = engine.search("rust", &SearchOptions::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn remove_unknown_document_is_an_error() {
        let engine = Engine::builder("catalog").build();
        engine.initialize().await.unwrap();
        assert!(engine.remove_document("missing").await.is_err());
    }

    #[tokio::test]
    async fn cache_is_invalidated_on_mutation() {
        let engine = Engine::builder("catalog").build();
        engine.initialize().await.unwrap();
        engine.add_document(sample_doc("Rust", "one")).await.unwrap();
        engine.search("rust", &SearchOptions::default()).await.unwrap();

        engine.add_document(sample_doc("Rust Two", "two")).await.unwrap();
        let results = engine.search("rust", &SearchOptions::default()).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn export_then_import_restores_search_results() {
        let engine = Engine::builder("catalog").build();
        engine.initialize().await.unwrap();
        engine.add_document(sample_doc("Rust Programming", "Learn systems code")).await.unwrap();
        let blob = engine.export_index().unwrap();

        let other = Engine::builder("catalog").build();
        other.initialize().await.unwrap();
        other.import_index(&blob).await.unwrap();

        let results = other.search("rust", &SearchOptions::default()).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn close_flushes_to_storage_and_blocks_further_calls() {
        let storage = Arc::new(crate::storage::MemoryStorage::new());
        let engine = Engine::builder("catalog").storage(storage.clone()).build();
        engine.initialize().await.unwrap();
        engine.add_document(sample_doc("Rust", "one")).await.unwrap();
        engine.close().await.unwrap();

        assert!(engine.search("rust", &SearchOptions::default()).await.is_err());
        assert!(storage.get("sylvan:index:catalog").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn events_fire_for_lifecycle_operations() {
        let sink = Arc::new(RecordingSink::new());
        let engine = Engine::builder("catalog").events(sink.clone()).build();
        engine.initialize().await.unwrap();
        engine.add_document(sample_doc("Rust", "one")).await.unwrap();

        let names: Vec<_> = sink.events().into_iter().map(|e| e.name).collect();
        assert!(names.contains(&"engine:initialized"));
        assert!(names.contains(&"index:start"));
        assert!(names.contains(&"index:complete"));
    }
}
