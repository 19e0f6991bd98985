#![no_main]

use std::num::NonZeroU16;

use libfuzzer_sys::fuzz_target;
use lrukit::config::SizedLruConfig;
use lrukit::error::InsertError;
use lrukit::policy::SizedLruCache;

// Fuzz arbitrary operation sequences on SizedLruCache
//
// Decodes bytes into insert, fetch, remove, remove_lru, and clear
// operations, tracking membership through a shadow list and checking the
// budget equation and full internal invariants after every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let hash_table_size = 1u32 << (data[0] % 7); // 1..=64 buckets
    let num_initial_items = u32::from(data[1] % 4);
    let cache_size = u32::from(data[2] % 64) + 4;
    let config = SizedLruConfig {
        hash_table_size,
        num_initial_items,
        hash_seed: 0xCAFE_BABE,
        cache_size,
    };
    let mut cache = SizedLruCache::try_new(config, |_value: u32| {}).unwrap();

    let mut shadow: Vec<(Vec<u8>, u32, u32)> = Vec::new();
    let mut next_value = 1u32;

    let mut idx = 3;
    while idx + 2 < data.len() {
        let op = data[idx] % 5;
        let keyspace = data[idx + 1] % 16;
        let weight = u16::from(data[idx + 2] % 16) + 1;
        let key = [b'k', keyspace];
        idx += 3;

        match op {
            0 => {
                // insert (skip duplicates: out of contract)
                if shadow.iter().all(|(k, _, _)| k != &key) {
                    let value = next_value;
                    next_value += 1;
                    let consumption = NonZeroU16::new(weight).unwrap();
                    match cache.insert(&key, value, consumption) {
                        Ok(()) => {
                            // Auto-eviction may have dropped shadow entries.
                            shadow.retain(|(k, _, _)| cache.fetch(k).is_some());
                            shadow.push((key.to_vec(), value, u32::from(weight)));
                        }
                        Err(InsertError::DoesntFit) => {
                            assert!(u32::from(weight) > cache_size);
                            assert!(cache.is_empty());
                            shadow.clear();
                        }
                        Err(err) => panic!("unexpected insert error: {err}"),
                    }
                }
            }
            1 => {
                // fetch
                let expected = shadow
                    .iter()
                    .find(|(k, _, _)| k == &key)
                    .map(|(_, value, _)| *value);
                assert_eq!(cache.fetch(&key), expected);
            }
            2 => {
                // remove
                let pos = shadow.iter().position(|(k, _, _)| k == &key);
                assert_eq!(cache.remove(&key), pos.is_some());
                if let Some(pos) = pos {
                    shadow.swap_remove(pos);
                }
            }
            3 => {
                // remove_lru
                let len_before = cache.len();
                let removed = cache.remove_lru();
                assert_eq!(removed, len_before != 0);
                if removed {
                    assert!(cache.len() < len_before);
                    shadow.retain(|(k, _, _)| cache.fetch(k).is_some());
                }
            }
            _ => {
                // clear
                cache.clear();
                shadow.clear();
                assert!(cache.is_empty());
                assert_eq!(cache.cache_left(), cache_size);
            }
        }

        let consumed: u32 = shadow.iter().map(|(_, _, w)| *w).sum();
        assert_eq!(cache.cache_left(), cache_size - consumed);
        assert_eq!(cache.len(), shadow.len());
        cache.debug_validate_invariants();
    }
});
