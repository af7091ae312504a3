pub mod lru;
pub mod ring;

use std::io;

use crate::arena::layout::SlotRef;
use crate::arena::Region;
use crate::config::EvictionPolicyKind;

/// Allocation discipline and eviction order of one shard's arena.
///
/// A policy owns the arena region. The shard asks it for space, and when
/// none is available, for the next victim to reclaim; the shard removes
/// the victim from the index before handing its range back.
pub trait EvictionPolicy: Send {
    /// Reserve `len` bytes, returning the offset. `None` means a victim
    /// must be reclaimed first.
    fn allocate(&mut self, len: usize) -> Option<usize>;
    /// Next record to reclaim, or `None` if the arena holds no records.
    fn victim(&self) -> Option<SlotRef>;
    /// Make the victim's range reusable.
    fn reclaim(&mut self, slot: SlotRef);
    /// A live record was deleted or replaced.
    fn release(&mut self, slot: SlotRef);
    fn record_access(&mut self, slot: SlotRef);
    /// True if a record of `len` bytes may overwrite `slot` in place.
    fn fits_in_place(&self, slot: SlotRef, len: usize) -> bool;
    /// Upper bound on reclaims a single allocation may need.
    fn eviction_bound(&self) -> usize;
    /// Bytes currently held by records, live or dead.
    fn used_bytes(&self) -> usize;
    fn region(&self) -> &Region;
    fn region_mut(&mut self) -> &mut Region;
    fn clear(&mut self);
}

/// Static dispatch over the shard eviction policies.
pub enum Policy {
    Ring(ring::RingArena),
    Lru(lru::LruArena),
}

impl Policy {
    pub fn new(kind: EvictionPolicyKind, capacity: usize, max_entry_size: usize) -> io::Result<Self> {
        let region = Region::new(capacity)?;
        Ok(match kind {
            EvictionPolicyKind::Ring => Self::Ring(ring::RingArena::new(region)),
            EvictionPolicyKind::Lru => Self::Lru(lru::LruArena::new(region, max_entry_size)),
        })
    }

    #[inline(always)]
    pub fn allocate(&mut self, len: usize) -> Option<usize> {
        match self {
            Self::Ring(p) => p.allocate(len),
            Self::Lru(p) => p.allocate(len),
        }
    }

    #[inline(always)]
    pub fn victim(&self) -> Option<SlotRef> {
        match self {
            Self::Ring(p) => p.victim(),
            Self::Lru(p) => p.victim(),
        }
    }

    #[inline(always)]
    pub fn reclaim(&mut self, slot: SlotRef) {
        match self {
            Self::Ring(p) => p.reclaim(slot),
            Self::Lru(p) => p.reclaim(slot),
        }
    }

    #[inline(always)]
    pub fn release(&mut self, slot: SlotRef) {
        match self {
            Self::Ring(p) => p.release(slot),
            Self::Lru(p) => p.release(slot),
        }
    }

    #[inline(always)]
    pub fn record_access(&mut self, slot: SlotRef) {
        match self {
            Self::Ring(p) => p.record_access(slot),
            Self::Lru(p) => p.record_access(slot),
        }
    }

    #[inline(always)]
    pub fn fits_in_place(&self, slot: SlotRef, len: usize) -> bool {
        match self {
            Self::Ring(p) => p.fits_in_place(slot, len),
            Self::Lru(p) => p.fits_in_place(slot, len),
        }
    }

    #[inline(always)]
    pub fn eviction_bound(&self) -> usize {
        match self {
            Self::Ring(p) => p.eviction_bound(),
            Self::Lru(p) => p.eviction_bound(),
        }
    }

    #[inline(always)]
    pub fn used_bytes(&self) -> usize {
        match self {
            Self::Ring(p) => p.used_bytes(),
            Self::Lru(p) => p.used_bytes(),
        }
    }

    #[inline(always)]
    pub fn region(&self) -> &Region {
        match self {
            Self::Ring(p) => p.region(),
            Self::Lru(p) => p.region(),
        }
    }

    #[inline(always)]
    pub fn region_mut(&mut self) -> &mut Region {
        match self {
            Self::Ring(p) => p.region_mut(),
            Self::Lru(p) => p.region_mut(),
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        match self {
            Self::Ring(p) => p.clear(),
            Self::Lru(p) => p.clear(),
        }
    }
}
