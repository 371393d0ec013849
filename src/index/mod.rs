//! The index layer: the character trie, the key→doc postings map, the
//! index mapper that ties them together, and the regex traversals.

pub mod mapper;
pub mod postings;
pub mod traversal;
pub mod trie;

pub use mapper::{Hit, IndexMapper, MatchMode};
pub use postings::Postings;
pub use trie::{ScoreContext, Trie, TrieBlob, TrieConfig};
