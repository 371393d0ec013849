//! The query processor: sanitizes, extracts phrases, tokenizes, strips
//! stop words, and stems a raw query string before it reaches the index
//! mapper.

pub mod processor;

pub use processor::{process, ProcessedQuery, Token};
