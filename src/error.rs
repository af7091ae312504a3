//! Error types for cache construction and cache operations.

use std::io;

use thiserror::Error;

/// Invalid construction parameters. Only ever returned by `Cache::new`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("shard count must be positive")]
    ZeroShards,

    #[error("shard count {0} is not a power of two")]
    ShardCountNotPowerOfTwo(usize),

    #[error("arena capacity per shard must be positive")]
    ZeroArenaCapacity,

    #[error("arena capacity per shard {0} exceeds the 4 GiB offset limit")]
    ArenaTooLarge(usize),

    #[error("max entry size must be positive")]
    ZeroMaxEntrySize,

    #[error("max entry size {max_entry_size} needs {record_len} bytes per record but a shard arena holds {capacity}")]
    EntryExceedsArena {
        max_entry_size: usize,
        record_len: usize,
        capacity: usize,
    },

    #[error("time to live must be positive")]
    ZeroTimeToLive,

    #[error("max entries per shard must be positive")]
    ZeroMaxEntries,

    #[error("unknown eviction policy {0:?} (expected \"ring\" or \"lru\")")]
    UnknownPolicy(String),

    #[error("failed to map shard arena: {0}")]
    ArenaMap(#[from] io::Error),
}

/// Errors surfaced by cache operations. None of them are retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Key plus value exceed the configured max entry size. Nothing was
    /// written.
    #[error("entry of {size} bytes exceeds max entry size {max}")]
    EntryTooLarge { size: usize, max: usize },

    #[error("key not found")]
    NotFound,

    /// The key was present but its time to live has passed. The entry has
    /// been removed.
    #[error("entry expired")]
    Expired,

    /// Eviction could not free enough room within its iteration bound.
    /// Nothing was written.
    #[error("capacity exhausted")]
    CapacityExhausted,
}

impl CacheError {
    /// True for lookups that found no live entry (`NotFound` or `Expired`).
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NotFound | Self::Expired)
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
