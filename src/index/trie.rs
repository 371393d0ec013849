//! A character trie mapping tokens to weighted, per-terminal document
//! references, with exact, prefix, and bounded-fuzzy lookups.

use std::collections::HashSet;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SylvanError};
use crate::scorer;

pub use crate::scorer::ScoreContext;

/// Trie-wide knobs. Not part of a single node.
#[derive(Debug, Clone)]
pub struct TrieConfig {
    /// Words are folded to this case before insertion/lookup unless this is
    /// `true`, in which case they are stored and matched verbatim.
    pub case_sensitive: bool,
    /// Words longer than this are silently ignored on insert.
    pub max_word_length: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_word_length: 50,
        }
    }
}

/// One node of the trie. Every node but the root corresponds to a single
/// character along some inserted word.
#[derive(Debug, Clone)]
pub struct TrieNode {
    pub(crate) children: AHashMap<char, Box<TrieNode>>,
    pub(crate) is_terminal: bool,
    pub(crate) document_refs: HashSet<String>,
    pub(crate) weight: f64,
    pub(crate) frequency: u64,
    pub(crate) last_accessed: i64,
    pub(crate) prefix_count: u64,
    pub(crate) depth: u32,
}

impl TrieNode {
    pub(crate) fn new(depth: u32) -> Self {
        Self {
            children: AHashMap::new(),
            is_terminal: false,
            document_refs: HashSet::new(),
            weight: 0.0,
            frequency: 0,
            last_accessed: 0,
            prefix_count: 0,
            depth,
        }
    }

    /// A node is collapsible once nothing about it is worth keeping: no
    /// children, no references, untouched weight and frequency.
    fn is_prunable(&self) -> bool {
        self.children.is_empty()
            && self.document_refs.is_empty()
            && self.weight == 0.0
            && self.frequency == 0
    }
}

/// The character trie itself.
#[derive(Debug, Clone)]
pub struct Trie {
    root: Box<TrieNode>,
    config: TrieConfig,
}

impl Trie {
    pub fn new(config: TrieConfig) -> Self {
        Self {
            root: Box::new(TrieNode::new(0)),
            config,
        }
    }

    fn normalize(&self, word: &str) -> String {
        if self.config.case_sensitive {
            word.to_string()
        } else {
            word.to_lowercase()
        }
    }

    /// Insert `word` as indexed by `doc_id`. Silently ignores an empty word,
    /// an empty `doc_id`, or a word longer than `max_word_length`.
    pub fn insert(&mut self, word: &str, doc_id: &str, now_ms: i64) {
        if word.is_empty() || doc_id.is_empty() || word.chars().count() > self.config.max_word_length {
            return;
        }
        let word = self.normalize(word);
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node
                .children
                .entry(ch)
                .or_insert_with(|| Box::new(TrieNode::new(node.depth + 1)));
            node.prefix_count += 1;
        }
        node.is_terminal = true;
        node.document_refs.insert(doc_id.to_string());
        node.frequency += 1;
        node.weight += 1.0;
        node.last_accessed = now_ms;
    }

    /// The root node, for callers (traversal) that need to walk the whole
    /// tree themselves.
    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    fn find_node(&self, word: &str) -> Option<&TrieNode> {
        let mut node = self.root.as_ref();
        for ch in word.chars() {
            node = node.children.get(&ch)?.as_ref();
        }
        Some(node)
    }

    /// Exact lookup: `word` must match a terminal node verbatim.
    pub fn exact_search(&self, word: &str, ctx: &ScoreContext) -> Vec<(String, f64)> {
        let word = self.normalize(word);
        let Some(node) = self.find_node(&word) else {
            return Vec::new();
        };
        if !node.is_terminal {
            return Vec::new();
        }
        let score = scorer::score_match(node, &word, ctx);
        node.document_refs
            .iter()
            .map(|id| (id.clone(), score))
            .collect()
    }

    /// Prefix lookup: every terminal descendant of `prefix`'s node
    /// contributes its document refs, scored against the matched prefix.
    pub fn prefix_search(&self, prefix: &str, ctx: &ScoreContext) -> Vec<(String, f64)> {
        let prefix = self.normalize(prefix);
        let Some(node) = self.find_node(&prefix) else {
            return Vec::new();
        };
        let mut results = Vec::new();
        collect_terminals(node, &prefix, ctx, &mut results);
        results
    }

    /// Bounded fuzzy lookup: recursive descent tracking an incremental edit
    /// distance bound for pruning, with the true edit distance recomputed
    /// at each terminal candidate.
    pub fn fuzzy_search(
        &self,
        word: &str,
        max_distance: u32,
        ctx: &ScoreContext,
    ) -> Vec<(String, f64, u32)> {
        let word = self.normalize(word);
        let query: Vec<char> = word.chars().collect();
        let mut results = Vec::new();
        let mut buf = String::new();
        fuzzy_recurse(&self.root, &mut buf, 0, 0, &query, max_distance, ctx, &mut results);
        results
    }

    /// Returns up to `limit` complete words reachable under `prefix`,
    /// ranked by weight (ties broken alphabetically).
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = self.normalize(prefix);
        let Some(node) = self.find_node(&prefix) else {
            return Vec::new();
        };
        let mut words = Vec::new();
        collect_words(node, &prefix, &mut words);
        words.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        words.into_iter().take(limit).map(|(w, _)| w).collect()
    }

    /// Removes `doc_id` from every word it was indexed under, decrementing
    /// `prefix_count` along each such path and pruning nodes that become
    /// empty. No-op if `doc_id` was never indexed.
    pub fn remove_document(&mut self, doc_id: &str) {
        let words = collect_words_for_document(&self.root, String::new(), doc_id);
        for word in words {
            remove_along_path(&mut self.root, &word, doc_id);
        }
    }

    /// Serializes the trie to the persisted blob shape: a DFS pre-order
    /// emission of `{is_terminal, document_refs, weight, frequency,
    /// children}` per node. `prefix_count`, `last_accessed`, and `depth` are
    /// not carried — they are derived from traversal position and
    /// deserialization time.
    pub fn to_blob(&self) -> TrieBlob {
        node_to_blob(&self.root)
    }

    /// Reconstructs a trie from a blob previously produced by [`to_blob`].
    /// `depth` is recomputed from traversal position and `last_accessed` is
    /// reset to `now_ms`; `prefix_count` is recomputed as well so it stays
    /// consistent with the reconstructed subtree.
    pub fn from_blob(blob: TrieBlob, config: TrieConfig, now_ms: i64) -> Result<Self> {
        let root = blob_to_node(&blob, 0, now_ms).map_err(SylvanError::serialization_mismatch)?;
        Ok(Self { root: Box::new(root), config })
    }
}

fn collect_terminals(node: &TrieNode, prefix: &str, ctx: &ScoreContext, out: &mut Vec<(String, f64)>) {
    if node.is_terminal {
        let score = scorer::score_match(node, prefix, ctx);
        out.extend(node.document_refs.iter().map(|id| (id.clone(), score)));
    }
    for child in node.children.values() {
        collect_terminals(child, prefix, ctx, out);
    }
}

fn collect_words(node: &TrieNode, path: &str, out: &mut Vec<(String, f64)>) {
    if node.is_terminal {
        out.push((path.to_string(), node.weight));
    }
    for (ch, child) in &node.children {
        let mut next = path.to_string();
        next.push(*ch);
        collect_words(child, &next, out);
    }
}

fn collect_words_for_document(node: &TrieNode, path: String, doc_id: &str) -> Vec<String> {
    let mut out = Vec::new();
    if node.is_terminal && node.document_refs.contains(doc_id) {
        out.push(path.clone());
    }
    for (ch, child) in &node.children {
        let mut next = path.clone();
        next.push(*ch);
        out.extend(collect_words_for_document(child, next, doc_id));
    }
    out
}

fn remove_along_path(node: &mut TrieNode, word: &str, doc_id: &str) {
    let mut chars = word.chars();
    let Some(ch) = chars.next() else {
        node.document_refs.remove(doc_id);
        if node.frequency > 0 {
            node.frequency -= 1;
        }
        if node.weight > 0.0 {
            node.weight -= 1.0;
        }
        return;
    };
    let rest: String = chars.collect();
    let mut prune_child = false;
    if let Some(child) = node.children.get_mut(&ch) {
        if child.prefix_count > 0 {
            child.prefix_count -= 1;
        }
        remove_along_path(child, &rest, doc_id);
        if child.is_prunable() {
            prune_child = true;
        }
    }
    if prune_child {
        node.children.remove(&ch);
    }
}

fn fuzzy_recurse(
    node: &TrieNode,
    current: &mut String,
    current_distance: u32,
    query_depth: usize,
    query: &[char],
    max_distance: u32,
    ctx: &ScoreContext,
    out: &mut Vec<(String, f64, u32)>,
) {
    if current_distance > max_distance {
        return;
    }

    if node.is_terminal {
        let distance = levenshtein(query, current);
        if distance <= max_distance {
            let score_base = scorer::score_match(node, current, ctx);
            let discount = (-(distance as f64)).exp();
            for id in &node.document_refs {
                out.push((id.clone(), score_base * discount, distance));
            }
        }
    }

    for (ch, child) in &node.children {
        // Substitution (or exact continuation when the characters match).
        let sub_cost = if query_depth < query.len() && query[query_depth] == *ch {
            0
        } else {
            1
        };
        current.push(*ch);
        fuzzy_recurse(
            child,
            current,
            current_distance + sub_cost,
            query_depth + 1,
            query,
            max_distance,
            ctx,
            out,
        );
        current.pop();

        // Insertion: adds a trie character without consuming a query one.
        current.push(*ch);
        fuzzy_recurse(
            child,
            current,
            current_distance + 1,
            query_depth,
            query,
            max_distance,
            ctx,
            out,
        );
        current.pop();
    }

    // Deletion: consumes a query character without descending the trie.
    if query_depth < query.len() {
        fuzzy_recurse(
            node,
            current,
            current_distance + 1,
            query_depth + 1,
            query,
            max_distance,
            ctx,
            out,
        );
    }
}

fn levenshtein(query: &[char], candidate: &str) -> u32 {
    let candidate: Vec<char> = candidate.chars().collect();
    let (n, m) = (query.len(), candidate.len());
    let mut row: Vec<u32> = (0..=m as u32).collect();
    for i in 1..=n {
        let mut prev_diag = row[0];
        row[0] = i as u32;
        for j in 1..=m {
            let tmp = row[j];
            row[j] = if query[i - 1] == candidate[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = tmp;
        }
    }
    row[m]
}

/// The persisted shape of one trie node, recursively nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieBlob {
    pub character: Option<char>,
    pub is_terminal: bool,
    pub document_refs: Vec<String>,
    pub weight: f64,
    pub frequency: u64,
    pub children: Vec<TrieBlob>,
}

fn node_to_blob(node: &TrieNode) -> TrieBlob {
    node_to_blob_with_char(node, None)
}

fn node_to_blob_with_char(node: &TrieNode, character: Option<char>) -> TrieBlob {
    TrieBlob {
        character,
        is_terminal: node.is_terminal,
        document_refs: node.document_refs.iter().cloned().collect(),
        weight: node.weight,
        frequency: node.frequency,
        children: node
            .children
            .iter()
            .map(|(ch, child)| node_to_blob_with_char(child, Some(*ch)))
            .collect(),
    }
}

fn blob_to_node(blob: &TrieBlob, depth: u32, now_ms: i64) -> std::result::Result<TrieNode, String> {
    let mut node = TrieNode::new(depth);
    node.is_terminal = blob.is_terminal;
    node.document_refs = blob.document_refs.iter().cloned().collect();
    node.weight = blob.weight;
    node.frequency = blob.frequency;
    node.last_accessed = now_ms;
    for child_blob in &blob.children {
        let ch = child_blob
            .character
            .ok_or_else(|| "trie blob child missing its character".to_string())?;
        let mut child = blob_to_node(child_blob, depth + 1, now_ms)?;
        child.prefix_count = subtree_size(&child);
        node.children.insert(ch, Box::new(child));
    }
    node.prefix_count = subtree_size(&node);
    Ok(node)
}

fn subtree_size(node: &TrieNode) -> u64 {
    let mut total = if node.is_terminal { 1 } else { 0 };
    for child in node.children.values() {
        total += subtree_size(child);
    }
    total
}
