//! A fixed-capacity key-value cache that packs entries into a few large
//! byte arenas instead of one heap object per entry.
//!
//! The cache is split into power-of-two shards, each with its own mutex,
//! anonymous memory mapping and flat open-addressing index. Records are
//! addressed by `(offset, len)` integers, so the allocator only ever sees
//! one mapping and two boxed slices per shard. Space is reclaimed either as
//! a ring ([`EvictionPolicyKind::Ring`]) or by least recent use over fixed
//! slots ([`EvictionPolicyKind::Lru`]).

mod arena;
mod cache;
mod clock;
mod config;
mod error;
mod hash;
mod index;
mod policy;
mod shard;
mod stats;

pub use cache::Cache;
pub use config::{CacheConfig, EvictionPolicyKind};
pub use error::{CacheError, CacheResult, ConfigError};
pub use stats::Stats;
