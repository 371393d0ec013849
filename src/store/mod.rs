//! The document store: the authoritative id→document map, with optional
//! bounded version history.

pub mod document_store;

pub use document_store::{DocumentStore, VersioningConfig};
