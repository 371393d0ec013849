//! Regex traversal of the trie, in either BFS or DFS order, bounded by a
//! depth cap and a wall-clock timeout.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::error::{Result, SylvanError};
use crate::index::trie::Trie;

/// Which order a traversal visits trie nodes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    Bfs,
    Dfs,
}

/// Knobs for a single traversal call.
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    pub max_depth: u32,
    pub timeout_ms: u64,
    /// `None` selects automatically from the pattern's complexity.
    pub mode: Option<TraversalMode>,
    pub case_sensitive: bool,
    /// When the pattern is a plain string (not already regex-like), wrap
    /// it in `\b...\b` so it only matches whole words. When `false`, a
    /// plain pattern matches as an unanchored substring.
    pub whole_word: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            timeout_ms: 5000,
            mode: None,
            case_sensitive: false,
            whole_word: false,
        }
    }
}

/// A single regex match found during traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexHit {
    pub doc_id: String,
    pub score: f64,
    pub matches: u32,
    pub path: String,
    pub positions: Vec<usize>,
    /// The literal matched substrings, in order of appearance.
    pub matched_text: Vec<String>,
}

const COMPLEX_MARKERS: &[char] = &['+', '*', '?', '|', '(', '[', '{'];

/// Heuristic mode selection: patterns with alternation/quantifiers/groups,
/// or longer than 20 characters, favor DFS so it can bail out of a
/// pathological branch quickly; everything else defaults to BFS, which
/// tends to surface shallow matches sooner.
fn select_mode(pattern: &str) -> TraversalMode {
    if pattern.chars().any(|c| COMPLEX_MARKERS.contains(&c)) || pattern.chars().count() > 20 {
        TraversalMode::Dfs
    } else {
        TraversalMode::Bfs
    }
}

/// Prepares `pattern` for matching: a pattern that already looks like a
/// regex (contains a complexity marker) is compiled as-is modulo case
/// folding; a plain string pattern is escaped and, if `whole_word` is set,
/// wrapped in `\b...\b` so it only matches whole words instead of an
/// arbitrary substring.
fn prepare_pattern(pattern: &str, case_sensitive: bool, whole_word: bool) -> Result<Regex> {
    let looks_like_regex = pattern.chars().any(|c| COMPLEX_MARKERS.contains(&c));
    let body = if looks_like_regex {
        pattern.to_string()
    } else {
        let escaped = regex::escape(pattern);
        if whole_word {
            format!(r"\b{escaped}\b")
        } else {
            escaped
        }
    };
    let prefixed = if case_sensitive {
        body
    } else {
        format!("(?i){body}")
    };
    Regex::new(&prefixed).map_err(|e| SylvanError::invalid_pattern(e.to_string()))
}

/// Runs a regex traversal of `trie`, returning every terminal word matching
/// `pattern` along with the documents indexed under it. Expiring the
/// timeout returns whatever was found so far rather than failing; an
/// unparsable pattern returns [`SylvanError::InvalidPattern`].
pub fn traverse(trie: &Trie, pattern: &str, config: &TraversalConfig, ctx: &crate::scorer::ScoreContext) -> Result<Vec<RegexHit>> {
    let regex = prepare_pattern(pattern, config.case_sensitive, config.whole_word)?;
    let mode = config.mode.unwrap_or_else(|| select_mode(pattern));
    let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);

    let mut results = Vec::new();
    let root = trie.root();

    match mode {
        TraversalMode::Bfs => traverse_bfs(root, &regex, config.max_depth, deadline, ctx, &mut results),
        TraversalMode::Dfs => traverse_dfs(root, String::new(), 0, &regex, config.max_depth, deadline, ctx, &mut results),
    }

    Ok(results)
}

fn emit_if_match(
    node: &crate::index::trie::TrieNode,
    word: &str,
    depth: u32,
    regex: &Regex,
    ctx: &crate::scorer::ScoreContext,
    out: &mut Vec<RegexHit>,
) {
    if !node.is_terminal {
        return;
    }
    let found: Vec<regex::Match> = regex.find_iter(word).collect();
    if found.is_empty() {
        return;
    }
    let positions: Vec<usize> = found.iter().map(|m| m.start()).collect();
    let matched_text: Vec<String> = found.iter().map(|m| m.as_str().to_string()).collect();
    let match_count = positions.len() as f64;
    let total_match_len: usize = found.iter().map(|m| m.len()).sum();
    let base = crate::scorer::score_match(node, word, ctx);
    let score = base * match_count * (total_match_len as f64 / word.len().max(1) as f64) / (depth as f64 + 1.0);
    for doc_id in &node.document_refs {
        out.push(RegexHit {
            doc_id: doc_id.clone(),
            score,
            matches: positions.len() as u32,
            path: word.to_string(),
            positions: positions.clone(),
            matched_text: matched_text.clone(),
        });
    }
}

fn traverse_bfs(
    root: &crate::index::trie::TrieNode,
    regex: &Regex,
    max_depth: u32,
    deadline: Instant,
    ctx: &crate::scorer::ScoreContext,
    out: &mut Vec<RegexHit>,
) {
    let mut queue: VecDeque<(&crate::index::trie::TrieNode, String, u32)> = VecDeque::new();
    queue.push_back((root, String::new(), 0));

    while let Some((node, word, depth)) = queue.pop_front() {
        if Instant::now() >= deadline {
            log::warn!("regex traversal timed out in bfs mode at depth {depth}, returning partial results");
            return;
        }
        emit_if_match(node, &word, depth, regex, ctx, out);
        if depth >= max_depth {
            continue;
        }
        for (ch, child) in &node.children {
            let mut next = word.clone();
            next.push(*ch);
            queue.push_back((child, next, depth + 1));
        }
    }
}

fn traverse_dfs(
    node: &crate::index::trie::TrieNode,
    word: String,
    depth: u32,
    regex: &Regex,
    max_depth: u32,
    deadline: Instant,
    ctx: &crate::scorer::ScoreContext,
    out: &mut Vec<RegexHit>,
) {
    if Instant::now() >= deadline {
        log::warn!("regex traversal timed out in dfs mode at depth {depth}, returning partial results");
        return;
    }
    emit_if_match(node, &word, depth, regex, ctx, out);
    if depth >= max_depth {
        return;
    }
    for (ch, child) in &node.children {
        let mut next = word.clone();
        next.push(*ch);
        traverse_dfs(child, next, depth + 1, regex, max_depth, deadline, ctx, out);
    }
}
