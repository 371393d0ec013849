//! Relevance scoring shared by exact, prefix, and fuzzy trie lookups.
//!
//! The combined score for a single term match is:
//!
//! ```text
//! node_score × tf_idf × position_boost × length_norm
//! ```
//!
//! `node_score` already folds in the node's weight, hit frequency, depth,
//! and recency; it is not a separate multiplicative factor. Fuzzy matches
//! additionally multiply by `exp(-edit_distance)`. None of these factors
//! are configurable per call; they read from [`ScoreContext`] and the
//! matched [`TrieNode`](crate::index::trie::TrieNode).

use crate::index::trie::TrieNode;

/// Half-life used by the recency decay, in milliseconds (24 hours).
const RECENCY_HALF_LIFE_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Read-only context a scoring pass needs beyond the matched node itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext {
    pub total_documents: usize,
    pub now_ms: i64,
}

impl ScoreContext {
    pub fn new(total_documents: usize, now_ms: i64) -> Self {
        Self {
            total_documents,
            now_ms,
        }
    }
}

/// `(node.frequency / total_documents) × log(total_documents / |document_refs|)`.
fn tf_idf(node: &TrieNode, total_documents: usize) -> f64 {
    let total = total_documents as f64;
    if total <= 0.0 {
        return 0.0;
    }
    let doc_frequency = node.document_refs.len().max(1) as f64;
    (node.frequency as f64 / total) * (total / doc_frequency).ln()
}

/// `1 / (node.depth + 1)`: shallower nodes (shorter matched paths) score
/// higher than deeply nested ones.
fn position_boost(node: &TrieNode) -> f64 {
    1.0 / (node.depth as f64 + 1.0)
}

/// `1 / sqrt(|term|)`: normalizes so long terms don't dominate purely by
/// character count.
fn length_norm(term_len: usize) -> f64 {
    1.0 / (term_len.max(1) as f64).sqrt()
}

/// Exponential recency decay with a 24-hour half-life.
fn recency_decay(last_accessed_ms: i64, now_ms: i64) -> f64 {
    let age_ms = (now_ms - last_accessed_ms).max(0) as f64;
    (-age_ms / RECENCY_HALF_LIFE_MS * std::f64::consts::LN_2).exp()
}

/// A node's own contribution: `(weight × frequency × recency) / (depth + 1)`.
fn node_score(node: &TrieNode, now_ms: i64) -> f64 {
    let recency = recency_decay(node.last_accessed, now_ms);
    (node.weight * node.frequency as f64 * recency) / (node.depth as f64 + 1.0)
}

/// Score a single exact/prefix match of `term` against `node`.
pub fn score_match(node: &TrieNode, term: &str, ctx: &ScoreContext) -> f64 {
    node_score(node, ctx.now_ms) * tf_idf(node, ctx.total_documents) * position_boost(node) * length_norm(term.len())
}

/// Score a fuzzy match: the exact-match score discounted by edit distance.
pub fn score_fuzzy_match(node: &TrieNode, term: &str, edit_distance: u32, ctx: &ScoreContext) -> f64 {
    score_match(node, term, ctx) * (-(edit_distance as f64)).exp()
}
