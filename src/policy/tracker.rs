//! Unbounded LRU tracking set with caller-driven bulk eviction.
//!
//! Tracks byte-string keys tagged with an opaque `u32` value. There is no
//! capacity limit; the caller decides when to shed load by calling
//! [`LruTracker::remove_lru`], which drops the least recently used *bucket
//! cohort* in one step.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                        LruTracker Layout                           │
//! │                                                                    │
//! │   BucketTable (heads)          ItemArena (records)                 │
//! │   ┌────────┬───────┐           ┌───────┬──────────────────────┐    │
//! │   │ bucket │ head  │           │ index │ { key, value, next } │    │
//! │   ├────────┼───────┤           ├───────┼──────────────────────┤    │
//! │   │   0    │ NONE  │           │   0   │ "a" → 7, next: 2     │    │
//! │   │   1    │  0 ───┼──────────►│   1   │ vacant, next: NONE   │    │
//! │   │   2    │ NONE  │           │   2   │ "b" → 9, next: NONE  │    │
//! │   │   3    │  4 ───┼──────────►│   ... │                      │    │
//! │   └────────┴───────┘           └───────┴──────────────────────┘    │
//! │                                                                    │
//! │   BucketLru: head ─► [1] ◄──► [3] ◄── tail                         │
//! │              (recency is per bucket row, not per item)             │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inserting or looking up a key promotes its whole bucket to the LRU head;
//! removing the last item of a bucket drops the bucket from the list.
//! `remove_lru` therefore evicts every item sharing the tail bucket at
//! once — recency resolution is traded for link-memory density.
//!
//! ## Operations
//!
//! | Operation    | Effect on LRU list                      | Complexity |
//! |--------------|-----------------------------------------|------------|
//! | `insert`     | bucket to head                          | O(1)*      |
//! | `lookup` hit | bucket to head                          | O(chain)   |
//! | `lookup` miss| none                                    | O(chain)   |
//! | `remove`     | bucket unlinked iff chain emptied       | O(chain)   |
//! | `remove_lru` | tail bucket unlinked, cohort evicted    | O(cohort)  |
//! | `clear`      | list emptied                            | O(n)       |
//!
//! \* amortized; growth of the item pool copies existing records.
//!
//! Every value leaves the tracker through the eviction sink exactly once:
//! on `remove`, on `remove_lru`, on `clear`, or on drop (drop walks the pool
//! in index order, not LRU order).

use crate::config::TrackerConfig;
use crate::ds::hash::murmur2;
use crate::ds::{BucketLru, BucketTable, ItemArena, NONE};
use crate::error::{CreateError, InsertError};
use crate::policy::try_copy_key;
use crate::traits::EvictionSink;

#[derive(Debug, Clone)]
struct TrackedItem {
    key: Box<[u8]>,
    value: u32,
}

/// Unbounded set of tagged keys with per-bucket LRU ordering.
///
/// # Example
///
/// ```
/// use lrukit::config::TrackerConfig;
/// use lrukit::policy::LruTracker;
///
/// let config = TrackerConfig {
///     hash_table_size: 16,
///     ..TrackerConfig::default()
/// };
/// let mut tracker = LruTracker::try_new(config, |_value: u32| {}).unwrap();
///
/// tracker.insert(b"texture/grass", 7).unwrap();
/// assert_eq!(tracker.lookup(b"texture/grass"), Some(7));
///
/// // Caller-driven eviction of the least recently used bucket cohort.
/// assert!(tracker.remove_lru());
/// assert_eq!(tracker.lookup(b"texture/grass"), None);
/// ```
#[derive(Debug)]
pub struct LruTracker<S: EvictionSink> {
    sink: S,
    buckets: BucketTable,
    lru: BucketLru,
    arena: ItemArena<TrackedItem>,
    seed: u32,
    invalid_value: u32,
    len: usize,
}

impl<S: EvictionSink> LruTracker<S> {
    /// Creates a tracker from validated configuration.
    ///
    /// Keys inserted later map to `config.hash_table_size` buckets;
    /// `config.invalid_value` marks vacant slots and is rejected by
    /// `insert`. Fails on invalid configuration or allocation failure, with
    /// nothing left allocated on either failure path.
    pub fn try_new(config: TrackerConfig, sink: S) -> Result<Self, CreateError> {
        config.validate()?;
        let vacant = TrackedItem {
            key: Box::default(),
            value: config.invalid_value,
        };
        let buckets =
            BucketTable::try_new(config.hash_table_size).map_err(|_| CreateError::OutOfMemory)?;
        let lru =
            BucketLru::try_new(config.hash_table_size).map_err(|_| CreateError::OutOfMemory)?;
        let arena = ItemArena::try_new(config.num_initial_items, config.hash_table_size, vacant)
            .map_err(|_| CreateError::OutOfMemory)?;
        Ok(Self {
            sink,
            buckets,
            lru,
            arena,
            seed: config.hash_seed,
            invalid_value: config.invalid_value,
            len: 0,
        })
    }

    /// Number of tracked keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of hash buckets.
    #[inline]
    pub fn hash_table_size(&self) -> u32 {
        self.buckets.size()
    }

    /// The configured vacant-slot sentinel.
    #[inline]
    pub fn invalid_value(&self) -> u32 {
        self.invalid_value
    }

    /// Inserts a key tagged with `value` and promotes its bucket to the LRU
    /// head.
    ///
    /// The key must not already be present; duplicate inserts are the
    /// caller's contract (checked by a debug assertion) and shadow the older
    /// entry in release builds. Rejects empty keys, keys longer than
    /// `u32::MAX` bytes, and `value == invalid_value`. On `OutOfMemory` the
    /// tracker is unchanged.
    pub fn insert(&mut self, key: &[u8], value: u32) -> Result<(), InsertError> {
        if key.is_empty() || u32::try_from(key.len()).is_err() {
            return Err(InsertError::InvalidKey);
        }
        if value == self.invalid_value {
            return Err(InsertError::ReservedValue);
        }

        let bucket = self.bucket_for(key);
        debug_assert!(
            self.find_in_bucket(bucket, key) == NONE,
            "key inserted twice"
        );

        // Fallible work first: either failure leaves the tracker untouched.
        let key_copy = try_copy_key(key).ok_or(InsertError::OutOfMemory)?;
        let index = self
            .arena
            .allocate()
            .map_err(|_| InsertError::OutOfMemory)?;

        let slot = self.arena.slot_mut(index);
        slot.payload.key = key_copy;
        slot.payload.value = value;

        if self.buckets.is_empty(bucket) {
            self.lru.push_head(bucket);
        } else {
            self.lru.promote(bucket);
        }

        self.arena.slot_mut(index).next = self.buckets.head(bucket);
        self.buckets.set_head(bucket, index);
        self.len += 1;

        self.check_internal_state();
        Ok(())
    }

    /// Returns the value tagged to `key`, promoting its bucket to the LRU
    /// head. A miss returns `None` and mutates nothing.
    pub fn lookup(&mut self, key: &[u8]) -> Option<u32> {
        if key.is_empty() || u32::try_from(key.len()).is_err() {
            return None;
        }
        let bucket = self.bucket_for(key);
        let index = self.find_in_bucket(bucket, key);
        if index == NONE {
            return None;
        }
        self.lru.promote(bucket);
        Some(self.arena.slot(index).payload.value)
    }

    /// Removes `key`, handing its value to the eviction sink.
    ///
    /// The bucket leaves the LRU list only if this was its last item;
    /// otherwise the bucket's recency is untouched. Returns `false` (with
    /// zero side effects) when the key is absent.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        if key.is_empty() || u32::try_from(key.len()).is_err() {
            return false;
        }
        let bucket = self.bucket_for(key);
        let index = self.find_in_bucket(bucket, key);
        if index == NONE {
            return false;
        }

        let value = self.arena.slot(index).payload.value;
        self.sink.evict(value);

        self.unlink_from_chain(bucket, index);
        self.arena.release(index);
        self.len -= 1;

        self.check_internal_state();
        true
    }

    /// Evicts every item in the least recently used bucket, handing each
    /// value to the eviction sink. Returns `false` when the tracker is
    /// empty.
    pub fn remove_lru(&mut self) -> bool {
        let Some(bucket) = self.lru.pop_tail() else {
            return false;
        };

        let mut iter = self.buckets.head(bucket);
        self.buckets.set_head(bucket, NONE);
        while iter != NONE {
            let next = self.arena.slot(iter).next;
            let item = self.arena.release(iter);
            self.sink.evict(item.value);
            self.len -= 1;
            iter = next;
        }

        self.check_internal_state();
        true
    }

    /// Removes every entry, handing each value to the eviction sink.
    ///
    /// Bucket table and LRU list are wiped and the item pool's free list is
    /// rebuilt over every slot; capacity is retained.
    pub fn clear(&mut self) {
        for (_bucket, head) in self.buckets.iter_non_empty() {
            let mut iter = head;
            while iter != NONE {
                let slot = self.arena.slot(iter);
                let value = slot.payload.value;
                let next = slot.next;
                self.sink.evict(value);
                iter = next;
            }
        }

        self.buckets.clear();
        self.lru.clear();
        self.arena.reset();
        self.len = 0;

        self.check_internal_state();
    }

    #[inline]
    fn bucket_for(&self, key: &[u8]) -> u32 {
        self.buckets.bucket_of(murmur2(key, self.seed))
    }

    fn find_in_bucket(&self, bucket: u32, key: &[u8]) -> u32 {
        let mut iter = self.buckets.head(bucket);
        while iter != NONE {
            let slot = self.arena.slot(iter);
            if slot.payload.key.as_ref() == key {
                return iter;
            }
            iter = slot.next;
        }
        NONE
    }

    /// Relinks the collision chain around `index`, unlinking the bucket from
    /// the LRU list if its chain became empty.
    fn unlink_from_chain(&mut self, bucket: u32, index: u32) {
        let next = self.arena.slot(index).next;
        let head = self.buckets.head(bucket);
        if head == index {
            self.buckets.set_head(bucket, next);
            if next == NONE {
                self.lru.unlink(bucket);
            }
        } else {
            let mut prev = head;
            loop {
                let prev_next = self.arena.slot(prev).next;
                debug_assert!(prev_next != NONE, "item not on its bucket chain");
                if prev_next == index {
                    break;
                }
                prev = prev_next;
            }
            self.arena.slot_mut(prev).next = next;
        }
    }

    #[inline]
    fn check_internal_state(&self) {
        debug_assert!(
            self.arena.first_free() == NONE || self.arena.first_free() < self.arena.capacity()
        );
        debug_assert!(self.lru.head() == NONE || self.lru.head() < self.buckets.size());
        debug_assert!(self.lru.tail() == NONE || self.lru.tail() < self.buckets.size());
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        use std::collections::HashSet;

        self.lru.debug_validate_invariants();
        let invalid = self.invalid_value;
        self.arena
            .debug_validate_invariants(|item| item.value == invalid);

        let mut chained = HashSet::new();
        let mut live = 0usize;
        for bucket in 0..self.buckets.size() {
            assert_eq!(!self.buckets.is_empty(bucket), self.lru.contains(bucket));

            let mut iter = self.buckets.head(bucket);
            while iter != NONE {
                assert!((iter as u64) < self.arena.capacity() as u64);
                assert!(chained.insert(iter), "item {iter} on two chains");
                let slot = self.arena.slot(iter);
                assert_ne!(slot.payload.value, invalid);
                assert_eq!(self.bucket_for(&slot.payload.key), bucket);
                live += 1;
                iter = slot.next;
            }
        }
        assert_eq!(live, self.len);
    }
}

impl<S: EvictionSink> Drop for LruTracker<S> {
    /// Hands every live value to the eviction sink, in arena-index order
    /// (not LRU order).
    fn drop(&mut self) {
        for (_index, slot) in self.arena.iter() {
            if slot.payload.value != self.invalid_value {
                self.sink.evict(slot.payload.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Evicted = Rc<RefCell<Vec<u32>>>;

    fn tracker_with_sink(
        config: TrackerConfig,
    ) -> (LruTracker<impl FnMut(u32)>, Evicted) {
        let evicted: Evicted = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let evicted = Rc::clone(&evicted);
            move |value: u32| evicted.borrow_mut().push(value)
        };
        (LruTracker::try_new(config, sink).unwrap(), evicted)
    }

    fn small_config() -> TrackerConfig {
        TrackerConfig {
            hash_table_size: 16,
            num_initial_items: 2,
            hash_seed: 0xCAFE_BABE,
            invalid_value: 0,
        }
    }

    #[test]
    fn insert_then_lookup_round_trips() {
        let (mut tracker, _evicted) = tracker_with_sink(small_config());
        tracker.insert(b"alpha", 1).unwrap();
        tracker.insert(b"beta", 2).unwrap();
        assert_eq!(tracker.lookup(b"alpha"), Some(1));
        assert_eq!(tracker.lookup(b"beta"), Some(2));
        assert_eq!(tracker.lookup(b"gamma"), None);
        assert_eq!(tracker.len(), 2);
        tracker.debug_validate_invariants();
    }

    #[test]
    fn remove_reports_value_to_sink() {
        let (mut tracker, evicted) = tracker_with_sink(small_config());
        tracker.insert(b"alpha", 1).unwrap();
        assert!(tracker.remove(b"alpha"));
        assert_eq!(*evicted.borrow(), vec![1]);
        assert_eq!(tracker.lookup(b"alpha"), None);
        assert!(tracker.is_empty());
        tracker.debug_validate_invariants();
    }

    #[test]
    fn remove_missing_key_has_no_side_effects() {
        let (mut tracker, evicted) = tracker_with_sink(small_config());
        tracker.insert(b"alpha", 1).unwrap();
        assert!(!tracker.remove(b"beta"));
        assert!(evicted.borrow().is_empty());
        assert_eq!(tracker.len(), 1);
        tracker.debug_validate_invariants();
    }

    #[test]
    fn insert_rejects_boundary_violations() {
        let (mut tracker, _evicted) = tracker_with_sink(small_config());
        assert_eq!(tracker.insert(b"", 1), Err(InsertError::InvalidKey));
        assert_eq!(tracker.insert(b"key", 0), Err(InsertError::ReservedValue));
        assert!(tracker.is_empty());
    }

    #[test]
    fn zero_initial_items_grows_on_first_insert() {
        let config = TrackerConfig {
            num_initial_items: 0,
            ..small_config()
        };
        let (mut tracker, _evicted) = tracker_with_sink(config);
        tracker.insert(b"alpha", 1).unwrap();
        assert_eq!(tracker.lookup(b"alpha"), Some(1));
        tracker.debug_validate_invariants();
    }

    #[test]
    fn growth_keeps_existing_entries_reachable() {
        let config = TrackerConfig {
            num_initial_items: 1,
            ..small_config()
        };
        let (mut tracker, _evicted) = tracker_with_sink(config);
        for i in 1u32..=64 {
            tracker.insert(format!("key-{i}").as_bytes(), i).unwrap();
        }
        for i in 1u32..=64 {
            assert_eq!(tracker.lookup(format!("key-{i}").as_bytes()), Some(i));
        }
        assert_eq!(tracker.len(), 64);
        tracker.debug_validate_invariants();
    }

    #[test]
    fn remove_lru_on_empty_tracker_reports_nothing() {
        let (mut tracker, evicted) = tracker_with_sink(small_config());
        assert!(!tracker.remove_lru());
        assert!(evicted.borrow().is_empty());
    }

    #[test]
    fn remove_lru_evicts_least_recent_cohort() {
        // Size-1 table: every key shares one bucket, so remove_lru drains
        // the whole tracker in one call.
        let config = TrackerConfig {
            hash_table_size: 1,
            ..small_config()
        };
        let (mut tracker, evicted) = tracker_with_sink(config);
        tracker.insert(b"alpha", 1).unwrap();
        tracker.insert(b"beta", 2).unwrap();
        tracker.insert(b"gamma", 3).unwrap();

        assert!(tracker.remove_lru());
        let mut seen = evicted.borrow().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(tracker.is_empty());
        assert!(!tracker.remove_lru());
        tracker.debug_validate_invariants();
    }

    #[test]
    fn lookup_miss_does_not_promote() {
        let (mut tracker, evicted) = tracker_with_sink(small_config());
        tracker.insert(b"alpha", 1).unwrap();
        tracker.insert(b"beta", 2).unwrap();
        // Misses between operations must not disturb eviction order.
        assert_eq!(tracker.lookup(b"nope"), None);
        assert_eq!(tracker.lookup(b"missing"), None);
        assert!(tracker.remove_lru());
        assert!(!evicted.borrow().is_empty());
        tracker.debug_validate_invariants();
    }

    #[test]
    fn promoted_bucket_survives_eviction() {
        let config = TrackerConfig {
            hash_table_size: 2,
            ..small_config()
        };
        let (mut tracker, _evicted) = tracker_with_sink(config);
        // Find two keys landing in different buckets.
        let mut keys: Vec<Vec<u8>> = Vec::new();
        let mut buckets_seen = std::collections::HashSet::new();
        for i in 0u32..64 {
            let key = format!("probe-{i}").into_bytes();
            let bucket = murmur2(&key, 0xCAFE_BABE) & 1;
            if buckets_seen.insert(bucket) {
                keys.push(key);
            }
            if keys.len() == 2 {
                break;
            }
        }
        let (first, second) = (keys[0].clone(), keys[1].clone());

        tracker.insert(&first, 1).unwrap();
        tracker.insert(&second, 2).unwrap();
        // Touch the older bucket so the newer one becomes the LRU tail.
        assert_eq!(tracker.lookup(&first), Some(1));
        assert!(tracker.remove_lru());
        assert_eq!(tracker.lookup(&first), Some(1));
        assert_eq!(tracker.lookup(&second), None);
        tracker.debug_validate_invariants();
    }

    #[test]
    fn clear_resets_and_tracker_stays_usable() {
        let (mut tracker, evicted) = tracker_with_sink(small_config());
        for i in 1u32..=10 {
            tracker.insert(format!("key-{i}").as_bytes(), i).unwrap();
        }
        tracker.clear();
        assert_eq!(evicted.borrow().len(), 10);
        assert!(tracker.is_empty());
        assert_eq!(tracker.lookup(b"key-1"), None);

        tracker.insert(b"again", 99).unwrap();
        assert_eq!(tracker.lookup(b"again"), Some(99));
        tracker.debug_validate_invariants();
    }

    #[test]
    fn drop_reports_every_live_value_once() {
        let evicted: Evicted = Rc::new(RefCell::new(Vec::new()));
        {
            let sink = {
                let evicted = Rc::clone(&evicted);
                move |value: u32| evicted.borrow_mut().push(value)
            };
            let mut tracker = LruTracker::try_new(small_config(), sink).unwrap();
            for i in 1u32..=5 {
                tracker.insert(format!("key-{i}").as_bytes(), i).unwrap();
            }
            tracker.remove(b"key-3");
        }
        let mut seen = evicted.borrow().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn removing_chain_interior_keeps_bucket_position() {
        let config = TrackerConfig {
            hash_table_size: 1,
            ..small_config()
        };
        let (mut tracker, evicted) = tracker_with_sink(config);
        tracker.insert(b"alpha", 1).unwrap();
        tracker.insert(b"beta", 2).unwrap();
        tracker.insert(b"gamma", 3).unwrap();

        // Interior and tail removals relink the chain without touching LRU.
        assert!(tracker.remove(b"beta"));
        assert_eq!(tracker.lookup(b"alpha"), Some(1));
        assert_eq!(tracker.lookup(b"gamma"), Some(3));
        assert_eq!(*evicted.borrow(), vec![2]);
        tracker.debug_validate_invariants();
    }
}
