//! The shape of a single search hit returned by the engine.

use crate::data::Document;

/// One ranked result from [`Engine::search`](crate::engine::Engine::search).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub score: f64,
    pub document: Document,
    /// The query terms, or (for a regex search) the matched substrings,
    /// that produced this result. Only populated when
    /// `SearchOptions::include_matches` is set.
    pub matches: Option<Vec<String>>,
}
