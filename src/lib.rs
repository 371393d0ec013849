//! `sylvan` is an embeddable, in-memory full-text search engine: a
//! character trie with weighted document references, a secondary postings
//! map, bounded fuzzy matching, regex traversal, relevance scoring, result
//! caching, document versioning, and a small async façade over it all.
//!
//! The [`Engine`] is the entry point most callers want:
//!
//! ```no_run
//! # use sylvan::{Engine, SearchOptions};
//! # async fn run() -> sylvan::Result<()> {
//! let engine = Engine::builder("catalog").build();
//! engine.initialize().await?;
//! engine.add_document(sylvan::Document::new().add_text("title", "Rust")).await?;
//! let hits = engine.search("rust", &SearchOptions::default()).await?;
//! # let _ = hits;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod index;
pub mod query;
pub mod scorer;
pub mod storage;
pub mod store;
pub mod util;

pub use data::{DataValue, Document, Relation, RelationKind, VersionEntry};
pub use engine::{Engine, EngineBuilder, EngineStats, SearchOptions, SearchOptionsBuilder, SearchResult, SortBy, SortOrder};
pub use error::{Result, SylvanError};
pub use events::{Event, EventSink, NullSink, RecordingSink};
pub use storage::{MemoryStorage, Storage};
pub use store::VersioningConfig;
