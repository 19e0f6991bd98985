//! Budgeted LRU cache keyed by consumption weight.
//!
//! Shares the [`tracker`](crate::policy::tracker) machinery (bucket table,
//! per-bucket LRU list, index-addressed item pool) and adds a fixed
//! consumption budget: every entry declares a nonzero weight, and an insert
//! that would overflow the budget first evicts least recently used bucket
//! cohorts until the entry fits. An entry heavier than the whole budget is
//! rejected with [`InsertError::DoesntFit`] after the eviction loop has
//! emptied the cache.
//!
//! The vacant-slot sentinel is `consumption == 0`, so no reserved value is
//! carved out of the `u32` value space; misses surface as `None` from
//! [`SizedLruCache::fetch`].
//!
//! Budget bookkeeping maintains `Σ consumption + cache_left == cache_size`
//! across every operation. `cache_left` is debited only after the fallible
//! allocations succeed, so an `OutOfMemory` insert cannot strand budget.

use std::num::NonZeroU16;

use crate::config::SizedLruConfig;
use crate::ds::hash::murmur2;
use crate::ds::{BucketLru, BucketTable, ItemArena, NONE};
use crate::error::{CreateError, InsertError};
use crate::policy::try_copy_key;
use crate::traits::EvictionSink;

#[derive(Debug, Clone)]
struct WeightedItem {
    key: Box<[u8]>,
    value: u32,
    /// Weight against the budget; zero marks a vacant slot.
    consumption: u16,
}

/// Bounded cache with consumption-weighted entries and automatic eviction.
///
/// # Example
///
/// ```
/// use std::num::NonZeroU16;
///
/// use lrukit::config::SizedLruConfig;
/// use lrukit::policy::SizedLruCache;
///
/// let config = SizedLruConfig {
///     hash_table_size: 16,
///     cache_size: 8,
///     ..SizedLruConfig::default()
/// };
/// let mut cache = SizedLruCache::try_new(config, |_value: u32| {}).unwrap();
///
/// let weight = NonZeroU16::new(5).unwrap();
/// cache.insert(b"shader/sky", 11, weight).unwrap();
/// assert_eq!(cache.fetch(b"shader/sky"), Some(11));
/// assert_eq!(cache.cache_left(), 3);
///
/// // A second heavy entry forces the first one out.
/// cache.insert(b"shader/sea", 12, weight).unwrap();
/// assert_eq!(cache.fetch(b"shader/sky"), None);
/// ```
#[derive(Debug)]
pub struct SizedLruCache<S: EvictionSink> {
    sink: S,
    buckets: BucketTable,
    lru: BucketLru,
    arena: ItemArena<WeightedItem>,
    seed: u32,
    cache_size: u32,
    cache_left: u32,
    len: usize,
}

impl<S: EvictionSink> SizedLruCache<S> {
    /// Creates a cache from validated configuration.
    ///
    /// Fails on invalid configuration or allocation failure, with nothing
    /// left allocated on either failure path.
    pub fn try_new(config: SizedLruConfig, sink: S) -> Result<Self, CreateError> {
        config.validate()?;
        let vacant = WeightedItem {
            key: Box::default(),
            value: 0,
            consumption: 0,
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
            cache_size: config.cache_size,
            cache_left: config.cache_size,
            len: 0,
        })
    }

    /// Number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total consumption budget.
    #[inline]
    pub fn cache_size(&self) -> u32 {
        self.cache_size
    }

    /// Budget not currently consumed by entries.
    #[inline]
    pub fn cache_left(&self) -> u32 {
        self.cache_left
    }

    /// Number of hash buckets.
    #[inline]
    pub fn hash_table_size(&self) -> u32 {
        self.buckets.size()
    }

    /// Inserts an entry weighing `consumption` against the budget.
    ///
    /// While the entry does not fit, least recently used bucket cohorts are
    /// evicted through the sink; those evictions stay in effect even if the
    /// insert then fails. Returns [`InsertError::DoesntFit`] if the weight
    /// exceeds the whole budget (the cache is empty at that point). Keys are
    /// limited to `u16::MAX` bytes; duplicate keys are the caller's contract
    /// (checked by a debug assertion). On `OutOfMemory` no entry has been
    /// added and the budget is unchanged.
    pub fn insert(
        &mut self,
        key: &[u8],
        value: u32,
        consumption: NonZeroU16,
    ) -> Result<(), InsertError> {
        if key.is_empty() || key.len() > u16::MAX as usize {
            return Err(InsertError::InvalidKey);
        }
        let weight = consumption.get() as u32;

        while self.cache_left < weight {
            if !self.evict_oldest() {
                break;
            }
        }
        if self.cache_left < weight {
            return Err(InsertError::DoesntFit);
        }

        let bucket = self.bucket_for(key);
        debug_assert!(
            self.find_in_bucket(bucket, key) == NONE,
            "key inserted twice"
        );

        let key_copy = try_copy_key(key).ok_or(InsertError::OutOfMemory)?;
        let index = self
            .arena
            .allocate()
            .map_err(|_| InsertError::OutOfMemory)?;

        let slot = self.arena.slot_mut(index);
        slot.payload.key = key_copy;
        slot.payload.value = value;
        slot.payload.consumption = consumption.get();

        if self.buckets.is_empty(bucket) {
            self.lru.push_head(bucket);
        } else {
            self.lru.promote(bucket);
        }

        self.arena.slot_mut(index).next = self.buckets.head(bucket);
        self.buckets.set_head(bucket, index);

        self.cache_left -= weight;
        self.len += 1;

        self.check_internal_state();
        Ok(())
    }

    /// Returns the value stored for `key`, promoting its bucket to the LRU
    /// head. A miss returns `None` and mutates nothing.
    pub fn fetch(&mut self, key: &[u8]) -> Option<u32> {
        if key.is_empty() || key.len() > u16::MAX as usize {
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

    /// Removes `key`, handing its value to the eviction sink and returning
    /// its consumption to the budget.
    ///
    /// The bucket leaves the LRU list only if this was its last item.
    /// Returns `false` (with zero side effects) when the key is absent.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        if key.is_empty() || key.len() > u16::MAX as usize {
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
        let item = self.arena.release(index);
        self.cache_left += item.consumption as u32;
        self.len -= 1;

        self.check_internal_state();
        true
    }

    /// Evicts the least recently used bucket cohort, returning each item's
    /// consumption to the budget. Returns `false` when the cache is empty.
    pub fn remove_lru(&mut self) -> bool {
        let removed = self.evict_oldest();
        self.check_internal_state();
        removed
    }

    /// Removes every entry, handing each value to the eviction sink and
    /// restoring the whole budget.
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
        self.cache_left = self.cache_size;
        self.len = 0;

        self.check_internal_state();
    }

    /// Drops the LRU-tail bucket's chain, settling budget and sink per item.
    /// Returns `false` when there is nothing to evict.
    fn evict_oldest(&mut self) -> bool {
        let Some(bucket) = self.lru.pop_tail() else {
            return false;
        };

        let mut iter = self.buckets.head(bucket);
        self.buckets.set_head(bucket, NONE);
        while iter != NONE {
            let next = self.arena.slot(iter).next;
            let item = self.arena.release(iter);
            self.cache_left += item.consumption as u32;
            self.sink.evict(item.value);
            self.len -= 1;
            iter = next;
        }
        true
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
        debug_assert!(self.cache_left <= self.cache_size);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        use std::collections::HashSet;

        self.lru.debug_validate_invariants();
        self.arena
            .debug_validate_invariants(|item| item.consumption == 0);

        let mut chained = HashSet::new();
        let mut live = 0usize;
        let mut consumed = 0u64;
        for bucket in 0..self.buckets.size() {
            assert_eq!(!self.buckets.is_empty(bucket), self.lru.contains(bucket));

            let mut iter = self.buckets.head(bucket);
            while iter != NONE {
                assert!(chained.insert(iter), "item {iter} on two chains");
                let slot = self.arena.slot(iter);
                assert_ne!(slot.payload.consumption, 0);
                assert_eq!(self.bucket_for(&slot.payload.key), bucket);
                consumed += slot.payload.consumption as u64;
                live += 1;
                iter = slot.next;
            }
        }
        assert_eq!(live, self.len);
        assert_eq!(consumed + self.cache_left as u64, self.cache_size as u64);
    }
}

impl<S: EvictionSink> Drop for SizedLruCache<S> {
    /// Hands every live value to the eviction sink, in arena-index order
    /// (not LRU order).
    fn drop(&mut self) {
        for (_index, slot) in self.arena.iter() {
            if slot.payload.consumption != 0 {
                self.sink.evict(slot.payload.value);
            }
        }
    }
}
