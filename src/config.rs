use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::arena::layout::record_len;
use crate::error::ConfigError;

/// How a shard reclaims arena space when it is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvictionPolicyKind {
    /// Variable-length records in a ring; the oldest written record goes
    /// first.
    #[default]
    Ring,
    /// Fixed slots of `max_entry_size`; the least recently read or written
    /// record goes first.
    Lru,
}

impl FromStr for EvictionPolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ring" | "fifo" => Ok(Self::Ring),
            "lru" => Ok(Self::Lru),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for EvictionPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ring => f.write_str("ring"),
            Self::Lru => f.write_str("lru"),
        }
    }
}

/// Cache construction parameters.
///
/// ```
/// use slabcache::{CacheConfig, EvictionPolicyKind};
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_shard_count(256)
///     .with_arena_capacity_per_shard(4 * 1024 * 1024)
///     .with_max_entry_size(200)
///     .with_time_to_live(Some(Duration::from_secs(600)))
///     .with_eviction_policy(EvictionPolicyKind::Ring);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of shards. Must be a power of two.
    pub shard_count: usize,
    /// Bytes mapped for each shard's arena.
    pub arena_capacity_per_shard: usize,
    /// Largest accepted key + value length, in bytes.
    pub max_entry_size: usize,
    /// Default time to live for `set` calls that pass no TTL. `None` means
    /// entries never expire.
    pub time_to_live: Option<Duration>,
    pub eviction_policy: EvictionPolicyKind,
    /// Index sizing. `None` derives it from the arena capacity.
    pub max_entries_per_shard: Option<usize>,
    /// Seed for the key hasher; fixes shard routing for a given config.
    pub hash_seed: u64,
}

pub const DEFAULT_SHARD_COUNT: usize = 16;
pub const DEFAULT_ARENA_CAPACITY: usize = 1024 * 1024;
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 4096;
pub const DEFAULT_HASH_SEED: u64 = 0x5eed_cafe_f00d_d00d;

/// Bytes of arena assumed per entry when sizing the index by default.
const DEFAULT_BYTES_PER_ENTRY: usize = 64;
const MIN_DERIVED_ENTRIES: usize = 16;

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            shard_count: DEFAULT_SHARD_COUNT,
            arena_capacity_per_shard: DEFAULT_ARENA_CAPACITY,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            time_to_live: None,
            eviction_policy: EvictionPolicyKind::Ring,
            max_entries_per_shard: None,
            hash_seed: DEFAULT_HASH_SEED,
        }
    }
}

impl CacheConfig {
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    pub fn with_arena_capacity_per_shard(mut self, bytes: usize) -> Self {
        self.arena_capacity_per_shard = bytes;
        self
    }

    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }

    pub fn with_time_to_live(mut self, ttl: Option<Duration>) -> Self {
        self.time_to_live = ttl;
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicyKind) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn with_max_entries_per_shard(mut self, entries: usize) -> Self {
        self.max_entries_per_shard = Some(entries);
        self
    }

    pub fn with_hash_seed(mut self, seed: u64) -> Self {
        self.hash_seed = seed;
        self
    }

    /// Index capacity per shard after defaults are applied.
    ///
    /// Never more than the arena can physically hold: one slot per entry
    /// for LRU, one header-only record per entry for the ring.
    pub fn effective_max_entries(&self) -> usize {
        let physical = match self.eviction_policy {
            EvictionPolicyKind::Ring => self.arena_capacity_per_shard / record_len(0, 0),
            EvictionPolicyKind::Lru => {
                self.arena_capacity_per_shard / record_len(0, self.max_entry_size)
            }
        };
        let wanted = self.max_entries_per_shard.unwrap_or_else(|| {
            (self.arena_capacity_per_shard / DEFAULT_BYTES_PER_ENTRY).max(MIN_DERIVED_ENTRIES)
        });
        wanted.min(physical).max(1)
    }

    /// Total arena bytes across all shards.
    pub fn total_capacity(&self) -> usize {
        self.shard_count.saturating_mul(self.arena_capacity_per_shard)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::ZeroShards);
        }
        if !self.shard_count.is_power_of_two() {
            return Err(ConfigError::ShardCountNotPowerOfTwo(self.shard_count));
        }
        if self.arena_capacity_per_shard == 0 {
            return Err(ConfigError::ZeroArenaCapacity);
        }
        if self.arena_capacity_per_shard > u32::MAX as usize {
            return Err(ConfigError::ArenaTooLarge(self.arena_capacity_per_shard));
        }
        if self.max_entry_size == 0 {
            return Err(ConfigError::ZeroMaxEntrySize);
        }
        let largest = record_len(0, self.max_entry_size);
        if largest > self.arena_capacity_per_shard {
            return Err(ConfigError::EntryExceedsArena {
                max_entry_size: self.max_entry_size,
                record_len: largest,
                capacity: self.arena_capacity_per_shard,
            });
        }
        if self.time_to_live == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeToLive);
        }
        if self.max_entries_per_shard == Some(0) {
            return Err(ConfigError::ZeroMaxEntries);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::layout::HEADER_SIZE;

    #[test]
    fn default_is_valid() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("ring".parse::<EvictionPolicyKind>().unwrap(), EvictionPolicyKind::Ring);
        assert_eq!(" LRU ".parse::<EvictionPolicyKind>().unwrap(), EvictionPolicyKind::Lru);
        assert!(matches!(
            "clock".parse::<EvictionPolicyKind>(),
            Err(ConfigError::UnknownPolicy(name)) if name == "clock"
        ));
        assert_eq!(EvictionPolicyKind::Lru.to_string(), "lru");
    }

    #[test]
    fn rejects_non_positive_values() {
        let base = CacheConfig::default();
        assert!(matches!(
            base.clone().with_shard_count(0).validate(),
            Err(ConfigError::ZeroShards)
        ));
        assert!(matches!(
            base.clone().with_shard_count(12).validate(),
            Err(ConfigError::ShardCountNotPowerOfTwo(12))
        ));
        assert!(matches!(
            base.clone().with_arena_capacity_per_shard(0).validate(),
            Err(ConfigError::ZeroArenaCapacity)
        ));
        assert!(matches!(
            base.clone().with_max_entry_size(0).validate(),
            Err(ConfigError::ZeroMaxEntrySize)
        ));
        assert!(matches!(
            base.clone().with_time_to_live(Some(Duration::ZERO)).validate(),
            Err(ConfigError::ZeroTimeToLive)
        ));
        assert!(matches!(
            base.with_max_entries_per_shard(0).validate(),
            Err(ConfigError::ZeroMaxEntries)
        ));
    }

    #[test]
    fn rejects_entry_larger_than_arena() {
        let config = CacheConfig::default()
            .with_arena_capacity_per_shard(100)
            .with_max_entry_size(100 - HEADER_SIZE + 1);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max entry size"));

        let fits = CacheConfig::default()
            .with_arena_capacity_per_shard(100)
            .with_max_entry_size(100 - HEADER_SIZE);
        assert!(fits.validate().is_ok());
    }

    #[test]
    fn effective_max_entries_is_physically_bounded() {
        let lru = CacheConfig::default()
            .with_eviction_policy(EvictionPolicyKind::Lru)
            .with_arena_capacity_per_shard(10 * (HEADER_SIZE + 40))
            .with_max_entry_size(40)
            .with_max_entries_per_shard(1000);
        assert_eq!(lru.effective_max_entries(), 10);

        let ring = CacheConfig::default().with_arena_capacity_per_shard(64 * 1024);
        assert_eq!(ring.effective_max_entries(), 1024);
    }
}
