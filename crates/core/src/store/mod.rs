//! Store contract: a durable `i32 → bytes` map.
//!
//! The kernel treats the store as an external collaborator; reads must be
//! cheap enough to sit inside the hot path after the binary filter. Two
//! implementations ship with the crate: [`MemoryStore`] for tests and the
//! offline harness, and [`log::LogStore`] backed by an append-only file.

pub mod log;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;

pub use log::LogStore;

/// Durable key→bytes map.
pub trait Store: Send + Sync {
    /// Insert or replace the value under `key`. Idempotent by key.
    fn upsert(&self, key: i32, value: &[u8]) -> io::Result<()>;

    /// Read the value under `key`, or `None` if absent.
    fn read(&self, key: i32) -> io::Result<Option<Vec<u8>>>;

    /// All stored keys, in no particular order. Used once at load.
    fn keys(&self) -> io::Result<Vec<i32>>;
}

/// Volatile in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<i32, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn upsert(&self, key: i32, value: &[u8]) -> io::Result<()> {
        self.entries.write().insert(key, value.to_vec());
        Ok(())
    }

    fn read(&self, key: i32) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(&key).cloned())
    }

    fn keys(&self) -> io::Result<Vec<i32>> {
        Ok(self.entries.read().keys().copied().collect())
    }
}
