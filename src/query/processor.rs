//! Query pipeline: sanitize → extract phrases → tokenize → drop stop words
//! → stem → reconstruct.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Words that survive both stop-word removal and stemming untouched,
/// because either step would otherwise mangle a term that happens to look
/// like a stop word (`is`, `was`, `has`, `does`, `this`, `his`) or look
/// stemmable (`series`, `species`, `test`, `tests`).
const EXCEPTIONS: &[&str] = &[
    "this", "his", "is", "was", "has", "does", "series", "species", "test", "tests",
];

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "an", "the", "and", "or", "but", "not", "in", "on", "at", "to", "for", "of", "with",
        "by", "from", "as", "into", "like", "through", "after", "before", "between", "during",
        "without", "within", "is", "was", "are", "were", "be", "been", "being", "has", "have",
        "had", "does", "did", "do", "this", "that", "these", "those", "it", "its",
    ]
    .into_iter()
    .collect();
    static ref EXCEPTION_SET: HashSet<&'static str> = EXCEPTIONS.iter().copied().collect();
}

/// A single unit of a processed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    And,
    Or,
    Not,
    /// `+term`: must be present.
    Required(String),
    /// `-term`: must be absent.
    Excluded(String),
    /// A `"quoted phrase"`, kept intact (no stop-word removal or stemming).
    Phrase(String),
    Term(String),
}

/// The result of running a raw query string through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedQuery {
    pub tokens: Vec<Token>,
    /// The tokens rejoined into a single query string, after stop-word
    /// removal and stemming, suitable for logging or re-parsing.
    pub reconstructed: String,
}

/// Runs the full pipeline over `query`.
pub fn process(query: &str) -> ProcessedQuery {
    let sanitized = sanitize(query);
    let (stripped, phrases) = extract_phrases(&sanitized);
    let raw_tokens = tokenize(&stripped, &phrases);
    let filtered: Vec<Token> = raw_tokens.into_iter().filter(|t| !is_removable_stop_word(t)).collect();
    let stemmed: Vec<Token> = filtered.into_iter().map(stem_token).collect();
    let reconstructed = reconstruct(&stemmed);
    ProcessedQuery {
        tokens: stemmed,
        reconstructed,
    }
}

/// Trims, collapses internal whitespace runs, and drops control characters.
fn sanitize(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !c.is_control() || *c == ' ').collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pulls `"quoted phrases"` out of `input`, replacing each with a
/// `__PHRASE_<n>__` placeholder and returning the extracted phrase text
/// alongside it. A backslash-escaped quote (`\"`) inside a phrase is kept
/// as a literal character rather than closing the phrase, which is as
/// close to "nested quotes" as a flat phrase extraction can get.
fn extract_phrases(input: &str) -> (String, Vec<String>) {
    let mut out = String::new();
    let mut phrases = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '"' {
            out.push(c);
            continue;
        }
        let mut phrase = String::new();
        while let Some(&next) = chars.peek() {
            if next == '\\' {
                chars.next();
                if let Some(escaped) = chars.next() {
                    phrase.push(escaped);
                }
                continue;
            }
            chars.next();
            if next == '"' {
                break;
            }
            phrase.push(next);
        }
        let idx = phrases.len();
        phrases.push(phrase);
        out.push_str(&format!(" __PHRASE_{idx}__ "));
    }

    (out, phrases)
}

fn tokenize(text: &str, phrases: &[String]) -> Vec<Token> {
    text.split_whitespace()
        .filter_map(|word| {
            if let Some(idx_str) = word.strip_prefix("__PHRASE_").and_then(|s| s.strip_suffix("__")) {
                let idx: usize = idx_str.parse().ok()?;
                return phrases.get(idx).cloned().map(Token::Phrase);
            }
            match word.to_uppercase().as_str() {
                "AND" => return Some(Token::And),
                "OR" => return Some(Token::Or),
                "NOT" => return Some(Token::Not),
                _ => {}
            }
            if let Some(rest) = word.strip_prefix('+') {
                if !rest.is_empty() {
                    return Some(Token::Required(rest.to_string()));
                }
            }
            if let Some(rest) = word.strip_prefix('-') {
                if !rest.is_empty() {
                    return Some(Token::Excluded(rest.to_string()));
                }
            }
            if word.is_empty() {
                None
            } else {
                Some(Token::Term(word.to_string()))
            }
        })
        .collect()
}

fn is_removable_stop_word(token: &Token) -> bool {
    match token {
        Token::Term(w) => is_stop_word(w),
        _ => false,
    }
}

fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(lower.as_str()) && !EXCEPTION_SET.contains(lower.as_str())
}

fn stem_token(token: Token) -> Token {
    match token {
        Token::Term(w) => Token::Term(stem(&w)),
        Token::Required(w) => Token::Required(stem(&w)),
        Token::Excluded(w) => Token::Excluded(stem(&w)),
        other => other,
    }
}

/// Suffix-based stemming: `-est`, `-er`, `-ing`, `-ed`/`-d`, `-ies`/`-es`/`-s`.
/// Words in [`EXCEPTIONS`] pass through untouched.
fn stem(word: &str) -> String {
    let lower = word.to_lowercase();
    if EXCEPTION_SET.contains(lower.as_str()) {
        return lower;
    }

    let len = lower.chars().count();

    if len > 5 && lower.ends_with("est") {
        return undouble_or_cvc_e(chop(&lower, 3));
    }
    if len > 4 && lower.ends_with("ies") {
        return format!("{}y", chop(&lower, 3));
    }
    if len > 4 && lower.ends_with("es") {
        let candidate = chop(&lower, 2);
        if ends_with_sibilant(&candidate) {
            return candidate;
        }
    }
    if len > 4 && lower.ends_with("ying") {
        return format!("{}y", chop(&lower, 4));
    }
    if len > 5 && lower.ends_with("ing") {
        return undouble_or_cvc_e(chop(&lower, 3));
    }
    if len > 4 && lower.ends_with("ied") {
        return format!("{}y", chop(&lower, 3));
    }
    if len > 4 && lower.ends_with("ed") {
        return undouble_or_cvc_e(chop(&lower, 2));
    }
    if len > 4 && lower.ends_with("er") {
        return chop(&lower, 2);
    }
    if len > 3 && lower.ends_with('s') && !lower.ends_with("ss") {
        return chop(&lower, 1);
    }

    lower
}

fn chop(word: &str, n: usize) -> String {
    let count = word.chars().count();
    word.chars().take(count.saturating_sub(n)).collect()
}

fn ends_with_sibilant(word: &str) -> bool {
    word.ends_with('s') || word.ends_with('x') || word.ends_with('z') || word.ends_with("ch") || word.ends_with("sh")
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Collapses a doubled trailing consonant (`runn` → `run`) or, failing
/// that, appends a silent `e` when the stem ends consonant-vowel-consonant
/// (`hop` → `hope`).
fn undouble_or_cvc_e(stem: String) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 1] == chars[n - 2] && !matches!(chars[n - 1], 'l' | 's' | 'z') {
        return chars[..n - 1].iter().collect();
    }
    if is_cvc(&chars) {
        let mut s = stem;
        s.push('e');
        return s;
    }
    stem
}

fn is_cvc(chars: &[char]) -> bool {
    if chars.len() < 3 {
        return false;
    }
    let n = chars.len();
    let (c1, v, c2) = (chars[n - 3], chars[n - 2], chars[n - 1]);
    !is_vowel(c1) && is_vowel(v) && !is_vowel(c2) && !matches!(c2, 'w' | 'x' | 'y')
}

fn reconstruct(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match t {
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Not => "NOT".to_string(),
            Token::Required(w) => format!("+{w}"),
            Token::Excluded(w) => format!("-{w}"),
            Token::Phrase(p) => format!("\"{p}\""),
            Token::Term(w) => w.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_stop_words_but_keeps_exceptions() {
        let result = process("the cat is happy");
        assert!(!result.tokens.contains(&Token::Term("the".into())));
        assert!(result.tokens.contains(&Token::Term("is".into())));
    }

    #[test]
    fn extracts_phrases_and_skips_internal_processing() {
        let result = process(r#"find "the quick fox" running"#);
        assert!(result.tokens.contains(&Token::Phrase("the quick fox".into())));
        assert!(result.tokens.contains(&Token::Term("run".into())));
    }

    #[test]
    fn handles_escaped_quotes_inside_a_phrase() {
        let result = process(r#""say \"hi\" now""#);
        assert_eq!(result.tokens, vec![Token::Phrase("say \"hi\" now".into())]);
    }

    #[test]
    fn recognizes_operators_and_modifiers() {
        let result = process("rust AND +fast -slow OR NOT old");
        assert_eq!(
            result.tokens,
            vec![
                Token::Term("rust".into()),
                Token::And,
                Token::Required("fast".into()),
                Token::Excluded("slow".into()),
                Token::Or,
                Token::Not,
                Token::Term("old".into()),
            ]
        );
    }

    #[test]
    fn stems_common_suffixes() {
        assert_eq!(stem("running"), "run");
        assert_eq!(stem("hoped"), "hope");
        assert_eq!(stem("flies"), "fly");
        assert_eq!(stem("boxes"), "box");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("biggest"), "big");
        assert_eq!(stem("faster"), "fast");
    }

    #[test]
    fn exceptions_are_never_stemmed_or_removed() {
        for word in EXCEPTIONS {
            assert_eq!(stem(word), *word);
        }
        let result = process("species test tests series");
        assert_eq!(result.tokens.len(), 4);
    }
}
