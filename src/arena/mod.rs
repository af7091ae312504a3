/// Arena memory for one shard.
///
/// A `Region` is a single anonymous memory mapping of a fixed size. It is
/// never resized and holds nothing but serialized records, so however many
/// entries a shard stores, the allocator only ever sees one block.
pub mod layout;

use std::io;

use memmap2::MmapMut;

use layout::{RecordHeader, SlotRef, HEADER_SIZE};

pub struct Region {
    mmap: MmapMut,
}

impl Region {
    /// Map a zeroed region of `capacity` bytes.
    pub fn new(capacity: usize) -> io::Result<Self> {
        if capacity == 0 || capacity > u32::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("arena capacity {capacity} outside 1..=u32::MAX"),
            ));
        }
        let mmap = MmapMut::map_anon(capacity)?;
        Ok(Region { mmap })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mmap.len()
    }

    /// Decode the header of the record at `offset`.
    #[inline]
    pub fn header(&self, offset: usize) -> RecordHeader {
        RecordHeader::decode(&self.mmap[offset..offset + HEADER_SIZE])
    }

    /// Key bytes of the record in `slot`.
    #[inline]
    pub fn key(&self, slot: SlotRef) -> &[u8] {
        let header = self.header(slot.start());
        let start = slot.start() + HEADER_SIZE;
        &self.mmap[start..start + header.key_len as usize]
    }

    /// Value bytes of the record in `slot`.
    #[inline]
    pub fn value(&self, slot: SlotRef) -> &[u8] {
        let header = self.header(slot.start());
        let start = slot.start() + HEADER_SIZE + header.key_len as usize;
        &self.mmap[start..start + header.value_len as usize]
    }

    /// True if the record in `slot` was written for exactly this key.
    #[inline]
    pub fn key_matches(&self, slot: SlotRef, key: &[u8]) -> bool {
        let header = self.header(slot.start());
        header.key_len as usize == key.len() && self.key(slot) == key
    }

    /// Serialize a record at `offset` and return its slot.
    pub fn write_record(
        &mut self,
        offset: usize,
        key_hash: u64,
        expires_at: u64,
        key: &[u8],
        value: &[u8],
    ) -> SlotRef {
        let header = RecordHeader {
            key_hash,
            expires_at,
            key_len: key.len() as u32,
            value_len: value.len() as u32,
        };
        let len = header.record_len();
        let dst = &mut self.mmap[offset..offset + len];

        header.encode(&mut dst[..HEADER_SIZE]);
        dst[HEADER_SIZE..HEADER_SIZE + key.len()].copy_from_slice(key);
        dst[HEADER_SIZE + key.len()..].copy_from_slice(value);

        SlotRef::new(offset, len)
    }
}
