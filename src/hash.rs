use std::hash::BuildHasher;

use ahash::RandomState;

/// Seeded 64-bit key hasher shared by every shard of a cache.
///
/// The high 32 bits select the shard and the low 32 bits pick the home
/// bucket inside that shard's index, so the two never correlate.
#[derive(Clone)]
pub struct KeyHasher {
    state: RandomState,
}

impl KeyHasher {
    pub fn new(seed: u64) -> Self {
        KeyHasher {
            state: RandomState::with_seeds(
                seed,
                seed ^ 0x9e37_79b9_7f4a_7c15,
                seed.rotate_left(17) ^ 0xbf58_476d_1ce4_e5b9,
                seed.rotate_left(41) ^ 0x94d0_49bb_1331_11eb,
            ),
        }
    }

    #[inline(always)]
    pub fn hash(&self, key: &[u8]) -> u64 {
        self.state.hash_one(key)
    }

    /// Shard index for `hash` given `mask = shard_count - 1`.
    #[inline(always)]
    pub fn shard_for(hash: u64, mask: usize) -> usize {
        ((hash >> 32) as usize) & mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_hash() {
        let a = KeyHasher::new(7);
        let b = KeyHasher::new(7);
        assert_eq!(a.hash(b"key-0000000001"), b.hash(b"key-0000000001"));
    }

    #[test]
    fn different_seeds_diverge() {
        let a = KeyHasher::new(1);
        let b = KeyHasher::new(2);
        assert_ne!(a.hash(b"key"), b.hash(b"key"));
    }

    #[test]
    fn shard_routing_stays_in_range() {
        let hasher = KeyHasher::new(0);
        let mut seen = [0usize; 8];
        for i in 0..4096u32 {
            let h = hasher.hash(format!("key-{i:010}").as_bytes());
            seen[KeyHasher::shard_for(h, 7)] += 1;
        }
        // every shard gets a share of a few thousand keys
        assert!(seen.iter().all(|&n| n > 256), "skewed routing: {seen:?}");
    }
}
