//! Trait seams shared by both cache types.
//!
//! The only seam the caches need is the eviction observer. Each cache owns
//! exactly one sink, invokes it synchronously on the thread performing the
//! triggering operation, and hands every stored value back through it
//! exactly once over the cache's lifetime (on `remove`, on LRU eviction, on
//! `clear`, or on drop). Ownership of the sink by the cache makes reentrant
//! calls into the same cache unrepresentable in safe code.

/// Receives values as they leave a cache.
///
/// Implemented for any `FnMut(u32)` closure, so sink state is whatever the
/// closure captures:
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use lrukit::config::TrackerConfig;
/// use lrukit::policy::LruTracker;
///
/// let evicted = Rc::new(RefCell::new(Vec::new()));
/// let sink = {
///     let evicted = Rc::clone(&evicted);
///     move |value: u32| evicted.borrow_mut().push(value)
/// };
///
/// let mut tracker = LruTracker::try_new(TrackerConfig::default(), sink).unwrap();
/// tracker.insert(b"key", 7).unwrap();
/// tracker.remove(b"key");
/// assert_eq!(*evicted.borrow(), vec![7]);
/// ```
pub trait EvictionSink {
    /// Called once for each value leaving the cache.
    fn evict(&mut self, value: u32);
}

impl<F: FnMut(u32)> EvictionSink for F {
    #[inline]
    fn evict(&mut self, value: u32) {
        self(value)
    }
}
