//! The storage boundary: the only place the engine suspends. Callers
//! supply a [`Storage`] implementation; `sylvan` ships an in-memory one for
//! tests and small embeddings.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryStorage;

/// A blob key-value store. All methods are async so an engine built on a
/// real backend (disk, a remote service) can suspend instead of blocking.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn clear(&self) -> Result<()>;
    async fn close(&self) -> Result<()>;
}
