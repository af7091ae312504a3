use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-shard counters. Written under the shard lock but read without it,
/// so they are atomics with relaxed ordering.
#[derive(Default)]
pub struct ShardCounters {
    pub entries: AtomicU64,
    pub overwrites: AtomicU64,
    pub evictions: AtomicU64,
    pub collisions: AtomicU64,
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub expired: AtomicU64,
    pub used_bytes: AtomicU64,
}

impl ShardCounters {
    #[inline(always)]
    pub fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    #[inline(always)]
    pub fn set(counter: &AtomicU64, value: u64) {
        counter.store(value, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Fold this shard's counters into `stats`.
    pub fn accumulate(&self, stats: &mut Stats) {
        stats.entries += Self::get(&self.entries);
        stats.overwrites += Self::get(&self.overwrites);
        stats.evictions += Self::get(&self.evictions);
        stats.collisions += Self::get(&self.collisions);
        stats.hits += Self::get(&self.hits);
        stats.misses += Self::get(&self.misses);
        stats.expired += Self::get(&self.expired);
        stats.used_bytes += Self::get(&self.used_bytes);
    }
}

/// Point-in-time statistics summed over all shards.
///
/// Shards are read one after another without a global lock, so under
/// concurrent writes the totals are approximate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub entries: u64,
    pub overwrites: u64,
    pub evictions: u64,
    pub collisions: u64,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub used_bytes: u64,
    pub capacity_bytes: u64,
}

impl Stats {
    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats(entries={}, overwrites={}, evictions={}, collisions={}, hits={}, misses={}, expired={}, used_bytes={}, capacity_bytes={})",
            self.entries,
            self.overwrites,
            self.evictions,
            self.collisions,
            self.hits,
            self.misses,
            self.expired,
            self.used_bytes,
            self.capacity_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_sums_shards() {
        let a = ShardCounters::default();
        let b = ShardCounters::default();
        ShardCounters::add(&a.entries, 3);
        ShardCounters::add(&b.entries, 4);
        ShardCounters::add(&b.hits, 1);
        ShardCounters::add(&b.misses, 3);

        let mut stats = Stats::default();
        a.accumulate(&mut stats);
        b.accumulate(&mut stats);

        assert_eq!(stats.entries, 7);
        assert_eq!(stats.hit_rate(), 0.25);
    }

    #[test]
    fn hit_rate_without_lookups() {
        assert_eq!(Stats::default().hit_rate(), 0.0);
    }
}
