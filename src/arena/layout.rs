/// Byte layout of one record inside an arena.
///
/// A record is a fixed `#[repr(C)]` header followed by the key bytes and
/// then the value bytes. Records carry no pointers; everything that refers
/// to a record does so with a `SlotRef` (offset + length).

/// Size of the fixed record header.
pub const HEADER_SIZE: usize = 24;

/// Fields ordered u64-first to avoid implicit alignment padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    pub key_hash: u64,   // 0..8
    pub expires_at: u64, // 8..16  (monotonic nanos, 0 = never)
    pub key_len: u32,    // 16..20
    pub value_len: u32,  // 20..24
}

const _: () = assert!(std::mem::size_of::<RecordHeader>() == HEADER_SIZE);

impl RecordHeader {
    /// Total bytes occupied by the record this header describes.
    #[inline]
    pub fn record_len(&self) -> usize {
        record_len(self.key_len as usize, self.value_len as usize)
    }

    #[inline]
    pub fn encode(&self, dst: &mut [u8]) {
        dst[0..8].copy_from_slice(&self.key_hash.to_ne_bytes());
        dst[8..16].copy_from_slice(&self.expires_at.to_ne_bytes());
        dst[16..20].copy_from_slice(&self.key_len.to_ne_bytes());
        dst[20..24].copy_from_slice(&self.value_len.to_ne_bytes());
    }

    #[inline]
    pub fn decode(src: &[u8]) -> Self {
        let mut u64buf = [0u8; 8];
        let mut u32buf = [0u8; 4];

        u64buf.copy_from_slice(&src[0..8]);
        let key_hash = u64::from_ne_bytes(u64buf);
        u64buf.copy_from_slice(&src[8..16]);
        let expires_at = u64::from_ne_bytes(u64buf);
        u32buf.copy_from_slice(&src[16..20]);
        let key_len = u32::from_ne_bytes(u32buf);
        u32buf.copy_from_slice(&src[20..24]);
        let value_len = u32::from_ne_bytes(u32buf);

        RecordHeader {
            key_hash,
            expires_at,
            key_len,
            value_len,
        }
    }
}

/// Total record size for a key and value of the given lengths.
#[inline]
pub fn record_len(key_len: usize, value_len: usize) -> usize {
    HEADER_SIZE + key_len + value_len
}

/// Location of a record inside its shard's arena.
///
/// `len` is the record's own length (header + key + value). A zero length
/// never describes a real record, which lets the index use it as its empty
/// marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRef {
    pub offset: u32,
    pub len: u32,
}

impl SlotRef {
    #[inline]
    pub fn new(offset: usize, len: usize) -> Self {
        debug_assert!(offset <= u32::MAX as usize && len <= u32::MAX as usize);
        SlotRef {
            offset: offset as u32,
            len: len as u32,
        }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.offset as usize
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.offset as usize + self.len as usize
    }
}
