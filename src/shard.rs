use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::arena::layout::{record_len, SlotRef};
use crate::clock;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult, ConfigError};
use crate::index::Index;
use crate::policy::Policy;
use crate::stats::ShardCounters;

struct ShardInner {
    policy: Policy,
    index: Index,
}

/// Whether a read refreshes recency and counts toward hit/miss stats.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Get,
    Peek,
}

/// One independently locked partition: an arena (owned by its eviction
/// policy), the index over it, and its counters.
///
/// Every operation holds the lock for a bounded amount of work and copies
/// values out before releasing it.
pub struct Shard {
    id: usize,
    inner: Mutex<ShardInner>,
    counters: ShardCounters,
}

impl Shard {
    pub fn new(id: usize, config: &CacheConfig) -> Result<Self, ConfigError> {
        let policy = Policy::new(
            config.eviction_policy,
            config.arena_capacity_per_shard,
            config.max_entry_size,
        )?;
        let index = Index::new(config.effective_max_entries());

        debug!(
            shard = id,
            capacity = config.arena_capacity_per_shard,
            max_entries = index.max_entries(),
            buckets = index.bucket_count(),
            policy = %config.eviction_policy,
            "shard arena mapped"
        );

        Ok(Shard {
            id,
            inner: Mutex::new(ShardInner { policy, index }),
            counters: ShardCounters::default(),
        })
    }

    pub fn counters(&self) -> &ShardCounters {
        &self.counters
    }

    pub fn len(&self) -> usize {
        ShardCounters::get(&self.counters.entries) as usize
    }

    /// Insert or overwrite `key`. Size limits are checked by the caller.
    pub fn set(&self, hash: u64, key: &[u8], value: &[u8], expires_at: u64) -> CacheResult<()> {
        let len = record_len(key.len(), value.len());
        let mut inner = self.inner.lock();
        let ShardInner { policy, index } = &mut *inner;

        let lookup = index.lookup(hash, |s| policy.region().key_matches(s, key));
        ShardCounters::add(&self.counters.collisions, lookup.collisions as u64);

        if let Some(old) = lookup.slot {
            if policy.fits_in_place(old, len) {
                let slot = policy
                    .region_mut()
                    .write_record(old.start(), hash, expires_at, key, value);
                index.insert(hash, slot, |s| s.offset == old.offset);
                policy.record_access(slot);
                ShardCounters::add(&self.counters.overwrites, 1);
                self.sync_occupancy(policy, index);
                return Ok(());
            }
        }

        let offset = match self.make_room(policy, index, len, lookup.slot) {
            Ok(offset) => offset,
            Err(e) => {
                self.sync_occupancy(policy, index);
                return Err(e);
            }
        };
        let slot = policy
            .region_mut()
            .write_record(offset, hash, expires_at, key, value);

        let region = policy.region();
        if let Some(old) = index.insert(hash, slot, |s| region.key_matches(s, key)) {
            policy.release(old);
        }
        // The old copy may already have been reclaimed by make_room
        if lookup.slot.is_some() {
            ShardCounters::add(&self.counters.overwrites, 1);
        }

        self.sync_occupancy(policy, index);
        Ok(())
    }

    /// Allocate `len` bytes, reclaiming victims until the record fits.
    ///
    /// A new key also needs a free index entry. `existing` is the key's
    /// current slot; reclaiming it is part of the overwrite, not an
    /// eviction. The loop runs at most `eviction_bound` reclaims.
    fn make_room(
        &self,
        policy: &mut Policy,
        index: &mut Index,
        len: usize,
        existing: Option<SlotRef>,
    ) -> CacheResult<usize> {
        let bound = policy.eviction_bound();
        let new_key = existing.is_none();

        for attempt in 0..=bound {
            if !(new_key && index.is_full()) {
                if let Some(offset) = policy.allocate(len) {
                    return Ok(offset);
                }
            }
            if attempt == bound {
                break;
            }

            let Some(victim) = policy.victim() else {
                break;
            };
            let hash = policy.region().header(victim.start()).key_hash;
            let own_copy = existing.is_some_and(|old| old.offset == victim.offset);
            if index.remove_slot(hash, victim) && !own_copy {
                ShardCounters::add(&self.counters.evictions, 1);
                trace!(shard = self.id, offset = victim.offset, len = victim.len, "evicted");
            }
            policy.reclaim(victim);
        }

        warn!(shard = self.id, len, bound, "eviction could not make room");
        Err(CacheError::CapacityExhausted)
    }

    /// Find the live slot for `key`, dropping it if it has expired.
    fn find_live(
        &self,
        inner: &mut ShardInner,
        hash: u64,
        key: &[u8],
        now: u64,
    ) -> CacheResult<SlotRef> {
        let ShardInner { policy, index } = inner;

        let lookup = index.lookup(hash, |s| policy.region().key_matches(s, key));
        ShardCounters::add(&self.counters.collisions, lookup.collisions as u64);

        let slot = lookup.slot.ok_or(CacheError::NotFound)?;
        let expires_at = policy.region().header(slot.start()).expires_at;
        if clock::is_expired(expires_at, now) {
            index.remove_slot(hash, slot);
            policy.release(slot);
            ShardCounters::add(&self.counters.expired, 1);
            self.sync_occupancy(policy, index);
            return Err(CacheError::Expired);
        }
        Ok(slot)
    }

    fn read(&self, hash: u64, key: &[u8], now: u64, access: Access) -> CacheResult<Vec<u8>> {
        let mut inner = self.inner.lock();

        let slot = match self.find_live(&mut *inner, hash, key, now) {
            Ok(slot) => slot,
            Err(e) => {
                if access == Access::Get {
                    ShardCounters::add(&self.counters.misses, 1);
                }
                return Err(e);
            }
        };

        let value = inner.policy.region().value(slot).to_vec();
        if access == Access::Get {
            inner.policy.record_access(slot);
            ShardCounters::add(&self.counters.hits, 1);
        }
        Ok(value)
    }

    /// Copy out the value for `key`, refreshing its recency.
    pub fn get(&self, hash: u64, key: &[u8], now: u64) -> CacheResult<Vec<u8>> {
        self.read(hash, key, now, Access::Get)
    }

    /// Copy out the value for `key` without touching recency or hit stats.
    pub fn peek(&self, hash: u64, key: &[u8], now: u64) -> CacheResult<Vec<u8>> {
        self.read(hash, key, now, Access::Peek)
    }

    /// Remaining time to live for `key`; `None` if it never expires.
    pub fn ttl(&self, hash: u64, key: &[u8], now: u64) -> CacheResult<Option<Duration>> {
        let mut inner = self.inner.lock();
        let slot = self.find_live(&mut *inner, hash, key, now)?;
        let expires_at = inner.policy.region().header(slot.start()).expires_at;
        Ok(clock::remaining(expires_at, now))
    }

    pub fn delete(&self, hash: u64, key: &[u8]) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        let ShardInner { policy, index } = &mut *inner;

        let region = policy.region();
        let slot = index
            .remove(hash, |s| region.key_matches(s, key))
            .ok_or(CacheError::NotFound)?;
        policy.release(slot);

        self.sync_occupancy(policy, index);
        Ok(())
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let ShardInner { policy, index } = &mut *inner;

        index.clear();
        policy.clear();
        self.sync_occupancy(policy, index);
    }

    #[inline]
    fn sync_occupancy(&self, policy: &Policy, index: &Index) {
        ShardCounters::set(&self.counters.entries, index.len() as u64);
        ShardCounters::set(&self.counters.used_bytes, policy.used_bytes() as u64);
    }
}
