/// Fixed-size open-addressing index from key hash to record slot.
///
/// Buckets live in one boxed slice of plain integers and the table is never
/// resized. It is sized at 2× the maximum entry count (rounded up to a power
/// of two) to keep load factor under 50%, uses linear probing from
/// `hash & mask`, and removes with backward-shift deletion so probe runs
/// stay contiguous without tombstones.
///
/// The stored hash doubles as the fingerprint: key bytes are only compared
/// (through the caller's `eq` closure, which reads the arena) when the full
/// 64-bit hash already matches.
use crate::arena::layout::SlotRef;

/// One bucket. `len == 0` marks an empty bucket.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub hash: u64,
    pub offset: u32,
    pub len: u32,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        hash: 0,
        offset: 0,
        len: 0,
    };

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    fn slot(&self) -> SlotRef {
        SlotRef {
            offset: self.offset,
            len: self.len,
        }
    }
}

const _: () = assert!(std::mem::size_of::<Bucket>() == 16);

/// Outcome of a probe sequence.
enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

/// Result of [`Index::lookup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub slot: Option<SlotRef>,
    /// Buckets whose fingerprint matched but whose key did not.
    pub collisions: u32,
}

pub struct Index {
    buckets: Box<[Bucket]>,
    mask: usize,
    len: usize,
    max_entries: usize,
}

impl Index {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        let capacity = (max_entries * 2).next_power_of_two();
        Index {
            buckets: vec![Bucket::EMPTY; capacity].into_boxed_slice(),
            mask: capacity - 1,
            len: 0,
            max_entries,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// True once the index holds `max_entries` keys; new keys must wait
    /// for an eviction.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len >= self.max_entries
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn probe(
        &self,
        hash: u64,
        mut eq: impl FnMut(SlotRef) -> bool,
        collisions: &mut u32,
    ) -> Probe {
        let mut idx = (hash as usize) & self.mask;

        for _ in 0..self.buckets.len() {
            let bucket = &self.buckets[idx];

            if bucket.is_empty() {
                return Probe::Vacant(idx);
            }

            if bucket.hash == hash {
                if eq(bucket.slot()) {
                    return Probe::Found(idx);
                }
                *collisions += 1;
            }

            idx = (idx + 1) & self.mask;
        }

        Probe::Full
    }

    /// Find the slot of the key whose bytes satisfy `eq`.
    pub fn lookup(&self, hash: u64, eq: impl FnMut(SlotRef) -> bool) -> Lookup {
        let mut collisions = 0;
        let slot = match self.probe(hash, eq, &mut collisions) {
            Probe::Found(idx) => Some(self.buckets[idx].slot()),
            Probe::Vacant(_) | Probe::Full => None,
        };
        Lookup { slot, collisions }
    }

    /// Map the key to `slot`, returning the slot it replaced, if any.
    ///
    /// Callers must check [`Index::is_full`] before inserting a new key.
    pub fn insert(
        &mut self,
        hash: u64,
        slot: SlotRef,
        eq: impl FnMut(SlotRef) -> bool,
    ) -> Option<SlotRef> {
        debug_assert!(slot.len > 0, "zero-length slot cannot be indexed");
        let mut collisions = 0;

        match self.probe(hash, eq, &mut collisions) {
            Probe::Found(idx) => {
                let old = self.buckets[idx].slot();
                self.buckets[idx].offset = slot.offset;
                self.buckets[idx].len = slot.len;
                Some(old)
            }
            Probe::Vacant(idx) => {
                self.buckets[idx] = Bucket {
                    hash,
                    offset: slot.offset,
                    len: slot.len,
                };
                self.len += 1;
                None
            }
            Probe::Full => {
                // Unreachable while len <= max_entries (load factor < 50%)
                debug_assert!(false, "index is full");
                None
            }
        }
    }

    /// Remove the key whose bytes satisfy `eq`.
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(SlotRef) -> bool) -> Option<SlotRef> {
        let mut collisions = 0;
        match self.probe(hash, eq, &mut collisions) {
            Probe::Found(idx) => {
                let old = self.buckets[idx].slot();
                self.remove_at(idx);
                Some(old)
            }
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    /// Remove the entry pointing at exactly `slot`.
    ///
    /// Offsets are unique within a shard, so this needs no key comparison.
    /// Returns false if `slot` is not live (already deleted or overwritten).
    pub fn remove_slot(&mut self, hash: u64, slot: SlotRef) -> bool {
        self.remove(hash, |s| s.offset == slot.offset).is_some()
    }

    /// Backward-shift deletion starting at `remove_idx`.
    fn remove_at(&mut self, remove_idx: usize) {
        let mask = self.mask;
        let mut empty = remove_idx;
        let mut j = (empty + 1) & mask;

        loop {
            let bucket_j = self.buckets[j];

            if bucket_j.is_empty() {
                break;
            }

            // Move bucket_j back if its home position is at or before `empty`
            let ideal = (bucket_j.hash as usize) & mask;
            let should_move = if empty <= j {
                ideal <= empty || ideal > j
            } else {
                ideal <= empty && ideal > j
            };

            if should_move {
                self.buckets[empty] = bucket_j;
                empty = j;
            }

            j = (j + 1) & mask;
        }

        self.buckets[empty] = Bucket::EMPTY;
        self.len -= 1;
    }

    pub fn clear(&mut self) {
        self.buckets.fill(Bucket::EMPTY);
        self.len = 0;
    }
}
