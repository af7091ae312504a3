/// LRU arena: the region is cut into fixed slots of
/// `HEADER_SIZE + max_entry_size` bytes.
///
/// Ordering and the free list are intrusive doubly-linked lists over slot
/// numbers, kept in a flat array of `u32` links beside the region. The list
/// head is the least recently used slot; new and touched slots move to the
/// tail, so among equally unused slots the oldest insertion goes first.
use crate::arena::layout::{SlotRef, HEADER_SIZE};
use crate::arena::Region;
use crate::policy::EvictionPolicy;

/// Sentinel value meaning "no slot" in prev/next links.
const SLOT_NONE: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct Link {
    prev: u32,
    next: u32,
}

pub struct LruArena {
    region: Region,
    slot_size: usize,
    links: Box<[Link]>,
    list_head: u32,
    list_tail: u32,
    free_head: u32,
    live: usize,
}

impl LruArena {
    pub fn new(region: Region, max_entry_size: usize) -> Self {
        let slot_size = HEADER_SIZE + max_entry_size;
        let slots = region.capacity() / slot_size;
        debug_assert!(slots > 0, "arena smaller than one slot");

        let mut arena = LruArena {
            region,
            slot_size,
            links: vec![
                Link {
                    prev: SLOT_NONE,
                    next: SLOT_NONE,
                };
                slots
            ]
            .into_boxed_slice(),
            list_head: SLOT_NONE,
            list_tail: SLOT_NONE,
            free_head: SLOT_NONE,
            live: 0,
        };
        arena.reset_links();
        arena
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.links.len()
    }

    /// Put every slot on the free list, in address order.
    fn reset_links(&mut self) {
        let slots = self.links.len();
        for (i, link) in self.links.iter_mut().enumerate() {
            link.prev = SLOT_NONE;
            link.next = if i + 1 < slots {
                (i + 1) as u32
            } else {
                SLOT_NONE
            };
        }
        self.free_head = if slots > 0 { 0 } else { SLOT_NONE };
        self.list_head = SLOT_NONE;
        self.list_tail = SLOT_NONE;
        self.live = 0;
    }

    #[inline]
    fn slot_index(&self, slot: SlotRef) -> u32 {
        debug_assert_eq!(slot.start() % self.slot_size, 0);
        (slot.start() / self.slot_size) as u32
    }

    #[inline]
    fn slot_ref(&self, index: u32) -> SlotRef {
        let offset = index as usize * self.slot_size;
        let header = self.region.header(offset);
        SlotRef::new(offset, header.record_len())
    }

    /// Remove a slot from the ordering list.
    fn list_remove(&mut self, index: u32) {
        let Link { prev, next } = self.links[index as usize];

        if prev != SLOT_NONE {
            self.links[prev as usize].next = next;
        } else {
            self.list_head = next;
        }

        if next != SLOT_NONE {
            self.links[next as usize].prev = prev;
        } else {
            self.list_tail = prev;
        }

        self.links[index as usize] = Link {
            prev: SLOT_NONE,
            next: SLOT_NONE,
        };
    }

    /// Push a slot to the tail of the list (most recently used position).
    fn list_push_tail(&mut self, index: u32) {
        self.links[index as usize] = Link {
            prev: self.list_tail,
            next: SLOT_NONE,
        };

        if self.list_tail != SLOT_NONE {
            self.links[self.list_tail as usize].next = index;
        } else {
            self.list_head = index;
        }

        self.list_tail = index;
    }

    fn free_push(&mut self, index: u32) {
        self.links[index as usize] = Link {
            prev: SLOT_NONE,
            next: self.free_head,
        };
        self.free_head = index;
    }
}

impl EvictionPolicy for LruArena {
    fn allocate(&mut self, len: usize) -> Option<usize> {
        if len == 0 || len > self.slot_size || self.free_head == SLOT_NONE {
            return None;
        }

        let index = self.free_head;
        self.free_head = self.links[index as usize].next;
        self.list_push_tail(index);
        self.live += 1;

        Some(index as usize * self.slot_size)
    }

    fn victim(&self) -> Option<SlotRef> {
        if self.list_head == SLOT_NONE {
            None
        } else {
            Some(self.slot_ref(self.list_head))
        }
    }

    fn reclaim(&mut self, slot: SlotRef) {
        self.release(slot);
    }

    fn release(&mut self, slot: SlotRef) {
        let index = self.slot_index(slot);
        self.list_remove(index);
        self.free_push(index);
        self.live -= 1;
    }

    fn record_access(&mut self, slot: SlotRef) {
        let index = self.slot_index(slot);
        if self.list_tail != index {
            self.list_remove(index);
            self.list_push_tail(index);
        }
    }

    fn fits_in_place(&self, _slot: SlotRef, len: usize) -> bool {
        len <= self.slot_size
    }

    fn eviction_bound(&self) -> usize {
        self.links.len() + 1
    }

    fn used_bytes(&self) -> usize {
        self.live * self.slot_size
    }

    fn region(&self) -> &Region {
        &self.region
    }

    fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    fn clear(&mut self) {
        self.reset_links();
    }
}
