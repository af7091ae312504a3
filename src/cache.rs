use std::time::Duration;

use tracing::debug;

use crate::clock;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult, ConfigError};
use crate::hash::KeyHasher;
use crate::shard::Shard;
use crate::stats::{ShardCounters, Stats};

/// A fixed-capacity key-value cache whose entries live in per-shard byte
/// arenas.
///
/// Keys route to a shard by hash, and each shard is guarded by its own
/// mutex, so a shared `&Cache` can be used from many threads. Values are
/// always copied out.
///
/// ```
/// use slabcache::{Cache, CacheConfig, CacheError};
///
/// let cache = Cache::new(CacheConfig::default()).unwrap();
/// cache.set(b"user:1", b"alice", None).unwrap();
/// assert_eq!(cache.get(b"user:1").unwrap(), b"alice");
///
/// cache.delete(b"user:1").unwrap();
/// assert_eq!(cache.get(b"user:1"), Err(CacheError::NotFound));
/// ```
pub struct Cache {
    shards: Box<[Shard]>,
    hasher: KeyHasher,
    mask: usize,
    config: CacheConfig,
}

impl Cache {
    /// Validate `config` and map every shard arena up front.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let shards = (0..config.shard_count)
            .map(|id| Shard::new(id, &config))
            .collect::<Result<Vec<_>, _>>()?
            .into_boxed_slice();

        debug!(
            shards = config.shard_count,
            total_capacity = config.total_capacity(),
            max_entry_size = config.max_entry_size,
            policy = %config.eviction_policy,
            "cache created"
        );

        Ok(Cache {
            shards,
            hasher: KeyHasher::new(config.hash_seed),
            mask: config.shard_count - 1,
            config,
        })
    }

    #[inline(always)]
    fn route(&self, key: &[u8]) -> (u64, &Shard) {
        let hash = self.hasher.hash(key);
        (hash, &self.shards[KeyHasher::shard_for(hash, self.mask)])
    }

    /// Insert or overwrite `key`.
    ///
    /// `ttl` of `None` falls back to the configured default time to live.
    /// Fails with `EntryTooLarge` when key and value together exceed
    /// `max_entry_size`, and with `CapacityExhausted` when eviction cannot
    /// make room; in both cases nothing is written.
    pub fn set(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let size = key.len() + value.len();
        if size > self.config.max_entry_size {
            return Err(CacheError::EntryTooLarge {
                size,
                max: self.config.max_entry_size,
            });
        }

        let expires_at = match ttl.or(self.config.time_to_live) {
            Some(ttl) => clock::expires_at(clock::now_nanos(), Some(ttl)),
            None => 0,
        };

        let (hash, shard) = self.route(key);
        shard.set(hash, key, value, expires_at)
    }

    /// Copy out the value for `key`. Under LRU this marks the entry as most
    /// recently used.
    pub fn get(&self, key: &[u8]) -> CacheResult<Vec<u8>> {
        let (hash, shard) = self.route(key);
        shard.get(hash, key, clock::now_nanos())
    }

    /// Like [`Cache::get`] but leaves LRU order and hit/miss counters alone.
    pub fn peek(&self, key: &[u8]) -> CacheResult<Vec<u8>> {
        let (hash, shard) = self.route(key);
        shard.peek(hash, key, clock::now_nanos())
    }

    /// Remaining time to live of `key`, or `None` if it never expires.
    pub fn ttl(&self, key: &[u8]) -> CacheResult<Option<Duration>> {
        let (hash, shard) = self.route(key);
        shard.ttl(hash, key, clock::now_nanos())
    }

    pub fn delete(&self, key: &[u8]) -> CacheResult<()> {
        let (hash, shard) = self.route(key);
        shard.delete(hash, key)
    }

    /// Number of live entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overwrite_count(&self) -> u64 {
        self.sum(|c| &c.overwrites)
    }

    pub fn eviction_count(&self) -> u64 {
        self.sum(|c| &c.evictions)
    }

    fn sum(&self, pick: fn(&ShardCounters) -> &std::sync::atomic::AtomicU64) -> u64 {
        self.shards
            .iter()
            .map(|s| ShardCounters::get(pick(s.counters())))
            .sum()
    }

    /// Snapshot of counters summed over all shards.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            capacity_bytes: self.capacity() as u64,
            ..Stats::default()
        };
        for shard in self.shards.iter() {
            shard.counters().accumulate(&mut stats);
        }
        stats
    }

    /// Drop every entry. Counters other than occupancy are kept.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Total arena bytes across all shards.
    pub fn capacity(&self) -> usize {
        self.config.total_capacity()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
