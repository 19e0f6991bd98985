#![no_main]

use libfuzzer_sys::fuzz_target;
use lrukit::ds::{BucketLru, NONE};

// Property-test BucketLru against a Vec model
//
// The model keeps bucket indices MRU-first; every operation must agree on
// order, endpoints, and membership, and the link invariants must hold.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let size = 1u32 << (data[0] % 7); // 1..=64 buckets
    let mut lru = BucketLru::try_new(size).unwrap();
    let mut model: Vec<u32> = Vec::new();

    let mut idx = 1;
    while idx + 1 < data.len() {
        let op = data[idx] % 4;
        let bucket = u32::from(data[idx + 1]) % size;
        idx += 2;

        match op {
            0 => {
                // push_head: only legal for absent buckets
                if !model.contains(&bucket) {
                    lru.push_head(bucket);
                    model.insert(0, bucket);
                }
            }
            1 => {
                // promote: only legal for present buckets
                if let Some(pos) = model.iter().position(|b| *b == bucket) {
                    lru.promote(bucket);
                    model.remove(pos);
                    model.insert(0, bucket);
                }
            }
            2 => {
                // unlink: only legal for present buckets
                if let Some(pos) = model.iter().position(|b| *b == bucket) {
                    lru.unlink(bucket);
                    model.remove(pos);
                }
            }
            _ => {
                // pop_tail
                assert_eq!(lru.pop_tail(), model.pop());
            }
        }

        assert_eq!(lru.is_empty(), model.is_empty());
        assert_eq!(lru.head(), model.first().copied().unwrap_or(NONE));
        assert_eq!(lru.tail(), model.last().copied().unwrap_or(NONE));
        assert_eq!(lru.iter().collect::<Vec<_>>(), model);
        for b in 0..size {
            assert_eq!(lru.contains(b), model.contains(&b));
        }
        lru.debug_validate_invariants();
    }
});
