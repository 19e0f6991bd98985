#![no_main]

use libfuzzer_sys::fuzz_target;
use lrukit::config::TrackerConfig;
use lrukit::policy::LruTracker;

// Fuzz arbitrary operation sequences on LruTracker
//
// Decodes bytes into insert, lookup, remove, remove_lru, and clear
// operations, checking return values against a shadow map and the full
// internal invariants after every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let hash_table_size = 1u32 << (data[0] % 7); // 1..=64 buckets
    let num_initial_items = u32::from(data[1] % 4);
    let config = TrackerConfig {
        hash_table_size,
        num_initial_items,
        hash_seed: 0xCAFE_BABE,
        invalid_value: 0,
    };
    let mut tracker = LruTracker::try_new(config, |_value: u32| {}).unwrap();

    let mut shadow: Vec<(Vec<u8>, u32)> = Vec::new();
    let mut next_value = 1u32;

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 5;
        let keyspace = data[idx + 1] % 16;
        let key = [b'k', keyspace];
        idx += 2;

        match op {
            0 => {
                // insert (skip duplicates: out of contract)
                if shadow.iter().all(|(k, _)| k != &key) {
                    let value = next_value;
                    next_value += 1;
                    tracker.insert(&key, value).unwrap();
                    shadow.push((key.to_vec(), value));
                }
            }
            1 => {
                // lookup
                let expected = shadow
                    .iter()
                    .find(|(k, _)| k == &key)
                    .map(|(_, value)| *value);
                assert_eq!(tracker.lookup(&key), expected);
            }
            2 => {
                // remove
                let pos = shadow.iter().position(|(k, _)| k == &key);
                assert_eq!(tracker.remove(&key), pos.is_some());
                if let Some(pos) = pos {
                    shadow.swap_remove(pos);
                }
            }
            3 => {
                // remove_lru: some non-empty cohort must leave
                let len_before = tracker.len();
                let removed = tracker.remove_lru();
                assert_eq!(removed, len_before != 0);
                if removed {
                    assert!(tracker.len() < len_before);
                    shadow.retain(|(k, _)| tracker.lookup(k).is_some());
                }
            }
            _ => {
                // clear
                tracker.clear();
                shadow.clear();
                assert!(tracker.is_empty());
            }
        }

        assert_eq!(tracker.len(), shadow.len());
        tracker.debug_validate_invariants();
    }
});
