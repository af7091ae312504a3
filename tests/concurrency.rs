// ==============================================
// CACHE CONCURRENCY TESTS (integration)
// ==============================================
//
// Many threads share one cache. These need real threads and cannot live
// inline.

use std::sync::{Arc, Barrier};
use std::thread;

use slabcache::{Cache, CacheConfig, CacheError, EvictionPolicyKind};

const THREADS: usize = 8;
const KEYS_PER_THREAD: usize = 2_000;
const ROUNDS: usize = 5;

fn shared_cache(policy: EvictionPolicyKind) -> Arc<Cache> {
    let config = CacheConfig::default()
        .with_shard_count(8)
        .with_arena_capacity_per_shard(64 * 1024)
        .with_max_entry_size(128)
        .with_eviction_policy(policy);
    Arc::new(Cache::new(config).unwrap())
}

fn key(thread: usize, i: usize) -> Vec<u8> {
    format!("t{thread}-k{i}").into_bytes()
}

fn value(thread: usize, i: usize, round: usize) -> Vec<u8> {
    format!("t{thread}-k{i}-r{round}").into_bytes()
}

// ==============================================
// Disjoint key sets: reads see the last write or a miss
// ==============================================

fn disjoint_writers_read_own_writes(policy: EvictionPolicyKind) {
    let cache = shared_cache(policy);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    for i in 0..KEYS_PER_THREAD {
                        cache.set(&key(t, i), &value(t, i, round), None).unwrap();
                        match cache.get(&key(t, i)) {
                            Ok(v) => assert_eq!(v, value(t, i, round)),
                            // evicted by another thread's inserts into the same shard
                            Err(e) => assert!(e.is_miss()),
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..THREADS {
        for i in 0..KEYS_PER_THREAD {
            match cache.get(&key(t, i)) {
                Ok(v) => assert_eq!(v, value(t, i, ROUNDS - 1)),
                Err(e) => assert_eq!(e, CacheError::NotFound),
            }
        }
    }

    let stats = cache.stats();
    assert!(stats.used_bytes <= stats.capacity_bytes);
    assert_eq!(stats.entries as usize, cache.len());
}

#[test]
fn ring_disjoint_writers() {
    disjoint_writers_read_own_writes(EvictionPolicyKind::Ring);
}

#[test]
fn lru_disjoint_writers() {
    disjoint_writers_read_own_writes(EvictionPolicyKind::Lru);
}

// ==============================================
// Shared keys: every read returns some complete written value
// ==============================================

#[test]
fn contended_key_never_tears() {
    let cache = shared_cache(EvictionPolicyKind::Ring);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mine = vec![t as u8; 64];
                barrier.wait();
                for _ in 0..5_000 {
                    cache.set(b"hot", &mine, None).unwrap();
                    if let Ok(v) = cache.get(b"hot") {
                        assert_eq!(v.len(), 64);
                        assert!(v.iter().all(|&b| b == v[0]));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.overwrite_count(), (THREADS * 5_000 - 1) as u64);
    assert_eq!(cache.eviction_count(), 0);
}

// ==============================================
// Deletes racing inserts keep counters consistent
// ==============================================

#[test]
fn delete_and_set_race() {
    let cache = shared_cache(EvictionPolicyKind::Lru);
    let barrier = Arc::new(Barrier::new(2));

    let writer = {
        let cache = cache.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            for i in 0..10_000usize {
                cache.set(&(i % 64).to_le_bytes(), b"value", None).unwrap();
            }
        })
    };
    let deleter = {
        let cache = cache.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            for i in 0..10_000usize {
                let _ = cache.delete(&(i % 64).to_le_bytes());
            }
        })
    };

    writer.join().unwrap();
    deleter.join().unwrap();

    let live = (0..64usize)
        .filter(|i| cache.peek(&i.to_le_bytes()).is_ok())
        .count();
    assert_eq!(live, cache.len());
}
