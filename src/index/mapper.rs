//! The index mapper: flattens document fields into tokens, drives the trie
//! and postings map, and aggregates per-term scores into ranked hits.

use regex::Regex;

use crate::data::{DataValue, Document};
use crate::error::{Result, SylvanError};
use crate::index::postings::Postings;
use crate::index::trie::{ScoreContext, Trie, TrieConfig};

lazy_static::lazy_static! {
    static ref TOKEN_BOUNDARY: Regex = Regex::new(r#"[\s,.!?;:'"()\[\]{}/\\]+"#).unwrap();
}

/// How a single term should be looked up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMode {
    Exact,
    Prefix,
    Fuzzy { max_distance: u32 },
}

/// A ranked document hit, aggregated across every term in a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub doc_id: String,
    pub score: f64,
    /// The query terms (or, for a regex search, the matched substrings)
    /// that produced this hit. Populated unconditionally; callers surface
    /// it only when `SearchOptions::include_matches` is set.
    pub matches: Vec<String>,
}

/// Owns the trie and postings map for one index.
#[derive(Debug, Clone)]
pub struct IndexMapper {
    trie: Trie,
    postings: Postings,
}

impl IndexMapper {
    pub fn new(config: TrieConfig) -> Self {
        Self {
            trie: Trie::new(config),
            postings: Postings::new(),
        }
    }

    /// Flattens `value` into a single searchable string: strings are
    /// trimmed, sequences are joined with spaces, and nothing else
    /// contributes text.
    fn flatten(value: &DataValue) -> String {
        match value {
            DataValue::Text(s) => s.trim().to_string(),
            DataValue::List(items) => items.join(" "),
            DataValue::Int(i) => i.to_string(),
            DataValue::Float(f) => f.to_string(),
            DataValue::Bool(b) => b.to_string(),
            DataValue::Null => String::new(),
        }
    }

    fn tokenize(text: &str) -> Vec<String> {
        TOKEN_BOUNDARY
            .split(text)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// Indexes every field of `document`. Each token is inserted twice:
    /// once plain, so an unscoped search matches any field, and once under
    /// a `field:token` composite key, so a search restricted to specific
    /// fields (`SearchOptions::fields`) can look up just those.
    pub fn index_document(&mut self, document: &Document, now_ms: i64) {
        for (field, value) in &document.fields {
            let flattened = Self::flatten(value);
            for token in Self::tokenize(&flattened) {
                self.trie.insert(&token, &document.id, now_ms);
                self.postings.map_key(&token, &document.id);

                let scoped = format!("{field}:{token}");
                self.trie.insert(&scoped, &document.id, now_ms);
                self.postings.map_key(&scoped, &document.id);
            }
        }
    }

    /// Removes `document`'s id from the trie and postings map entirely.
    pub fn remove_document(&mut self, doc_id: &str) {
        self.trie.remove_document(doc_id);
        self.postings.remove_document(doc_id);
    }

    /// Re-indexes a document: removes its prior postings/trie entries, then
    /// indexes the new version.
    pub fn update_document(&mut self, document: &Document, now_ms: i64) {
        self.remove_document(&document.id);
        self.index_document(document, now_ms);
    }

    /// Looks up a single term and returns its per-document scores.
    fn search_term(&self, term: &str, mode: MatchMode, ctx: &ScoreContext) -> Vec<(String, f64)> {
        match mode {
            MatchMode::Exact => self.trie.exact_search(term, ctx),
            MatchMode::Prefix => self.trie.prefix_search(term, ctx),
            MatchMode::Fuzzy { max_distance } => self
                .trie
                .fuzzy_search(term, max_distance, ctx)
                .into_iter()
                .map(|(id, score, _)| (id, score))
                .collect(),
        }
    }

    /// Searches for every term in `terms` under `mode`, aggregating each
    /// document's score as the sum of its per-term scores divided by the
    /// number of query terms (a fixed denominator, not the number of terms
    /// that document happened to match), sorted descending, truncated to
    /// `max_results`.
    ///
    /// When `fields` is non-empty, each term is looked up as `field:term`
    /// for every named field instead of against the combined index, and
    /// `boost` multiplies that field's contribution. When `fields` is
    /// empty, the plain unscoped key is looked up at its ordinary weight
    /// and, additionally, a `field:term` lookup is layered in for every
    /// field named in `boost` with a non-default factor, so boosting a
    /// field still has an effect on an otherwise unscoped search.
    pub fn search(
        &self,
        terms: &[String],
        mode: MatchMode,
        max_results: usize,
        fields: &[String],
        boost: &std::collections::HashMap<String, f64>,
        ctx: &ScoreContext,
    ) -> Result<Vec<Hit>> {
        if terms.is_empty() {
            return Err(SylvanError::invalid_options("search requires at least one term"));
        }

        let mut sums: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
        let mut matched_terms: std::collections::HashMap<String, std::collections::HashSet<String>> =
            std::collections::HashMap::new();

        for term in terms {
            let mut contributions: Vec<(String, f64)> = Vec::new();
            if fields.is_empty() {
                contributions.extend(self.search_term(term, mode, ctx));
                for (field, factor) in boost {
                    if *factor == 1.0 {
                        continue;
                    }
                    let scoped = format!("{field}:{term}");
                    contributions.extend(
                        self.search_term(&scoped, mode, ctx)
                            .into_iter()
                            .map(|(doc_id, score)| (doc_id, score * factor)),
                    );
                }
            } else {
                for field in fields {
                    let scoped = format!("{field}:{term}");
                    let factor = boost.get(field).copied().unwrap_or(1.0);
                    contributions.extend(
                        self.search_term(&scoped, mode, ctx)
                            .into_iter()
                            .map(|(doc_id, score)| (doc_id, score * factor)),
                    );
                }
            }

            for (doc_id, score) in contributions {
                *sums.entry(doc_id.clone()).or_insert(0.0) += score;
                matched_terms.entry(doc_id).or_default().insert(term.clone());
            }
        }

        let denominator = terms.len() as f64;
        let mut hits: Vec<Hit> = sums
            .into_iter()
            .map(|(doc_id, total)| {
                let mut matches: Vec<String> = matched_terms.remove(&doc_id).unwrap_or_default().into_iter().collect();
                matches.sort();
                Hit {
                    doc_id,
                    score: total / denominator,
                    matches,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(max_results);
        Ok(hits)
    }

    /// `true` if `key` (a normalized token) is present for `doc_id` via the
    /// postings map, without touching the trie.
    pub fn contains(&self, key: &str, doc_id: &str) -> bool {
        self.postings.contains(key, doc_id)
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn trie_mut(&mut self) -> &mut Trie {
        &mut self.trie
    }

    pub fn postings(&self) -> &Postings {
        &self.postings
    }

    /// Rebuilds a mapper from a previously persisted trie and postings
    /// snapshot, for import.
    pub fn from_parts(trie: Trie, postings: Postings) -> Self {
        Self { trie, postings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Document;

    fn ctx() -> ScoreContext {
        ScoreContext::new(10, 1_000_000)
    }

    fn doc(id: &str, title: &str, content: &str) -> Document {
        Document::with_id(id).add_text("title", title).add_text("content", content)
    }

    fn no_boost() -> std::collections::HashMap<String, f64> {
        std::collections::HashMap::new()
    }

    #[test]
    fn indexes_and_finds_exact_terms() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust Programming", "Learn systems code"), 1_000_000);
        let hits = mapper
            .search(&["rust".to_string()], MatchMode::Exact, 10, &[], &no_boost(), &ctx())
            .unwrap();
        assert_eq!(hits[0].doc_id, "d-1");
    }

    #[test]
    fn tokenizes_on_punctuation() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust, Programming!", ""), 1_000_000);
        assert!(mapper.contains("rust", "d-1"));
        assert!(mapper.contains("programming", "d-1"));
    }

    #[test]
    fn update_document_drops_stale_terms() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust", ""), 1_000_000);
        mapper.update_document(&doc("d-1", "Python", ""), 1_000_000);
        assert!(!mapper.contains("rust", "d-1"));
        assert!(mapper.contains("python", "d-1"));
    }

    #[test]
    fn search_aggregates_score_across_terms() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust Programming", ""), 1_000_000);
        mapper.index_document(&doc("d-2", "Rust", ""), 1_000_000);
        let hits = mapper
            .search(
                &["rust".to_string(), "programming".to_string()],
                MatchMode::Exact,
                10,
                &[],
                &no_boost(),
                &ctx(),
            )
            .unwrap();
        assert_eq!(hits[0].doc_id, "d-1");
    }

    #[test]
    fn search_divides_by_the_fixed_query_term_count() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        // "d-1" matches both query terms, "d-2" matches only one; neither
        // should be penalized relative to the number of terms it personally
        // matched, only relative to the two-term query as a whole.
        mapper.index_document(&doc("d-1", "Rust Programming", ""), 1_000_000);
        mapper.index_document(&doc("d-2", "Rust", ""), 1_000_000);
        let hits = mapper
            .search(
                &["rust".to_string(), "programming".to_string()],
                MatchMode::Exact,
                10,
                &[],
                &no_boost(),
                &ctx(),
            )
            .unwrap();
        let d1 = hits.iter().find(|h| h.doc_id == "d-1").unwrap();
        let d2 = hits.iter().find(|h| h.doc_id == "d-2").unwrap();
        assert!(d1.score > d2.score);
    }

    #[test]
    fn search_respects_field_scoping() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust", "Python"), 1_000_000);
        let title_hits = mapper
            .search(&["rust".to_string()], MatchMode::Exact, 10, &["title".to_string()], &no_boost(), &ctx())
            .unwrap();
        assert_eq!(title_hits.len(), 1);
        let content_hits = mapper
            .search(&["rust".to_string()], MatchMode::Exact, 10, &["content".to_string()], &no_boost(), &ctx())
            .unwrap();
        assert!(content_hits.is_empty());
    }

    #[test]
    fn boost_amplifies_a_fields_contribution_in_an_unscoped_search() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust", "Python"), 1_000_000);
        mapper.index_document(&doc("d-2", "Python", "Rust"), 1_000_000);

        let mut boost = std::collections::HashMap::new();
        boost.insert("title".to_string(), 3.0);

        let hits = mapper
            .search(&["rust".to_string()], MatchMode::Exact, 10, &[], &boost, &ctx())
            .unwrap();
        let d1 = hits.iter().find(|h| h.doc_id == "d-1").unwrap();
        let d2 = hits.iter().find(|h| h.doc_id == "d-2").unwrap();
        assert!(d1.score > d2.score);
    }

    #[test]
    fn matches_surfaces_the_query_terms_that_contributed_to_a_hit() {
        let mut mapper = IndexMapper::new(TrieConfig::default());
        mapper.index_document(&doc("d-1", "Rust Programming", ""), 1_000_000);
        let hits = mapper
            .search(
                &["rust".to_string(), "programming".to_string()],
                MatchMode::Exact,
                10,
                &[],
                &no_boost(),
                &ctx(),
            )
            .unwrap();
        assert_eq!(hits[0].matches, vec!["programming".to_string(), "rust".to_string()]);
    }

    #[test]
    fn search_rejects_empty_term_list() {
        let mapper = IndexMapper::new(TrieConfig::default());
        assert!(mapper.search(&[], MatchMode::Exact, 10, &[], &no_boost(), &ctx()).is_err());
    }
}
