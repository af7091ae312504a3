/// Ring (FIFO) arena: variable-length records appended at a bump pointer.
///
/// Live data occupies `[head, tail)` or, after a wrap, `[head, wrap_end)`
/// followed by `[0, tail)`. Allocation never crosses `head`: when the next
/// record does not fit, the oldest record at `head` must be reclaimed.
/// Deleted and overwritten records stay in place as dead bytes until `head`
/// passes them.
use crate::arena::layout::{SlotRef, HEADER_SIZE};
use crate::arena::Region;
use crate::policy::EvictionPolicy;

pub struct RingArena {
    region: Region,
    head: usize,
    tail: usize,
    /// End of the data written before the last wrap. Only meaningful when
    /// `wrapped` is set.
    wrap_end: usize,
    wrapped: bool,
    records: usize,
    used: usize,
}

impl RingArena {
    pub fn new(region: Region) -> Self {
        RingArena {
            region,
            head: 0,
            tail: 0,
            wrap_end: 0,
            wrapped: false,
            records: 0,
            used: 0,
        }
    }

    fn reset_cursors(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.wrap_end = 0;
        self.wrapped = false;
    }

    #[cfg(test)]
    fn records(&self) -> usize {
        self.records
    }
}

impl EvictionPolicy for RingArena {
    fn allocate(&mut self, len: usize) -> Option<usize> {
        let capacity = self.region.capacity();
        if len == 0 || len > capacity {
            return None;
        }
        if self.records == 0 {
            self.reset_cursors();
        }

        let offset = if !self.wrapped {
            if capacity - self.tail >= len {
                self.tail
            } else if self.head >= len {
                // Wrap: the gap [tail, capacity) is left unused
                self.wrap_end = self.tail;
                self.wrapped = true;
                0
            } else {
                return None;
            }
        } else if self.head - self.tail >= len {
            self.tail
        } else {
            return None;
        };

        self.tail = offset + len;
        self.records += 1;
        self.used += len;
        Some(offset)
    }

    fn victim(&self) -> Option<SlotRef> {
        if self.records == 0 {
            return None;
        }
        let header = self.region.header(self.head);
        Some(SlotRef::new(self.head, header.record_len()))
    }

    fn reclaim(&mut self, slot: SlotRef) {
        debug_assert_eq!(slot.start(), self.head, "ring reclaims only at head");

        self.head = slot.end();
        self.records -= 1;
        self.used -= slot.len as usize;

        if self.records == 0 {
            self.reset_cursors();
        } else if self.wrapped && self.head == self.wrap_end {
            self.head = 0;
            self.wrapped = false;
            self.wrap_end = 0;
        }
    }

    fn release(&mut self, _slot: SlotRef) {
        // Space comes back when head passes the record
    }

    fn record_access(&mut self, _slot: SlotRef) {
        // FIFO: no reordering on access
    }

    fn fits_in_place(&self, _slot: SlotRef, _len: usize) -> bool {
        // Overwrites always append so the ring stays in write order
        false
    }

    fn eviction_bound(&self) -> usize {
        self.region.capacity() / HEADER_SIZE + 1
    }

    fn used_bytes(&self) -> usize {
        self.used
    }

    fn region(&self) -> &Region {
        &self.region
    }

    fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    fn clear(&mut self) {
        self.reset_cursors();
        self.records = 0;
        self.used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::layout::record_len;
    use proptest::prelude::*;

    /// Record length for a one-byte key and 16-byte value.
    const REC: usize = HEADER_SIZE + 1 + 16;

    fn ring(capacity: usize) -> RingArena {
        RingArena::new(Region::new(capacity).unwrap())
    }

    fn put(ring: &mut RingArena, key: u8) -> Option<SlotRef> {
        let offset = ring.allocate(REC)?;
        Some(ring.region_mut().write_record(offset, key as u64, 0, &[key], &[key; 16]))
    }

    fn evict(ring: &mut RingArena) -> SlotRef {
        let victim = ring.victim().unwrap();
        ring.reclaim(victim);
        victim
    }

    #[test]
    fn appends_until_full() {
        let mut ring = ring(2 * REC);
        assert_eq!(put(&mut ring, b'a').unwrap().start(), 0);
        assert_eq!(put(&mut ring, b'b').unwrap().start(), REC);
        assert!(put(&mut ring, b'c').is_none());
        assert_eq!(ring.used_bytes(), 2 * REC);
    }

    #[test]
    fn wraps_after_reclaiming_oldest() {
        let mut ring = ring(2 * REC);
        let a = put(&mut ring, b'a').unwrap();
        put(&mut ring, b'b').unwrap();

        assert_eq!(evict(&mut ring), a);
        let c = put(&mut ring, b'c').unwrap();
        assert_eq!(c.start(), 0);
        assert_eq!(ring.region().key(c), b"c");

        // next victim is b, then c after the wrap
        let victim = evict(&mut ring);
        assert_eq!(ring.region().key(victim), b"b");
        let victim = evict(&mut ring);
        assert_eq!(ring.region().key(victim), b"c");
        assert!(ring.victim().is_none());
        assert_eq!(ring.used_bytes(), 0);
    }

    #[test]
    fn wrap_leaves_gap_at_end() {
        // room for 2 records plus a 10 byte tail gap
        let mut ring = ring(2 * REC + 10);
        put(&mut ring, b'a').unwrap();
        put(&mut ring, b'b').unwrap();
        evict(&mut ring);

        let c = put(&mut ring, b'c').unwrap();
        assert_eq!(c.start(), 0);
        let victim = evict(&mut ring);
        assert_eq!(ring.region().key(victim), b"b");
        // head jumped over the gap back to the start
        assert_eq!(ring.victim().unwrap(), c);
    }

    #[test]
    fn rejects_oversized() {
        let mut ring = ring(REC);
        assert!(ring.allocate(REC + 1).is_none());
        assert!(ring.allocate(0).is_none());
        assert!(ring.allocate(REC).is_some());
    }

    #[test]
    fn clear_resets() {
        let mut ring = ring(4 * REC);
        put(&mut ring, b'a').unwrap();
        put(&mut ring, b'b').unwrap();
        ring.clear();
        assert_eq!(ring.used_bytes(), 0);
        assert!(ring.victim().is_none());
        assert_eq!(put(&mut ring, b'c').unwrap().start(), 0);
    }

    proptest! {
        /// Property: occupancy never exceeds capacity and the victim is
        /// always the oldest surviving record.
        #[test]
        fn prop_fifo_order_and_bounded_occupancy(
            sizes in prop::collection::vec(0usize..48, 1..200)
        ) {
            let capacity = 256;
            let mut ring = ring(capacity);
            let mut live: std::collections::VecDeque<(u64, SlotRef)> = Default::default();

            for (i, value_len) in sizes.into_iter().enumerate() {
                let len = record_len(1, value_len);
                let mut bound = ring.eviction_bound();
                let offset = loop {
                    if let Some(offset) = ring.allocate(len) {
                        break offset;
                    }
                    let victim = ring.victim().unwrap();
                    let (hash, oldest) = live.pop_front().unwrap();
                    prop_assert_eq!(victim, oldest);
                    prop_assert_eq!(ring.region().header(victim.start()).key_hash, hash);
                    ring.reclaim(victim);
                    bound -= 1;
                };
                let slot = ring
                    .region_mut()
                    .write_record(offset, i as u64, 0, &[i as u8], &vec![7u8; value_len]);
                live.push_back((i as u64, slot));

                prop_assert!(ring.used_bytes() <= capacity);
                prop_assert_eq!(ring.records(), live.len());
                prop_assert!(bound > 0);
            }
        }
    }
}
