pub mod sized_lru;
pub mod tracker;

pub use sized_lru::SizedLruCache;
pub use tracker::LruTracker;

/// Copies key bytes into an owned buffer, reserving fallibly so an
/// allocation failure surfaces as `None` instead of aborting.
pub(crate) fn try_copy_key(key: &[u8]) -> Option<Box<[u8]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(key.len()).ok()?;
    buf.extend_from_slice(key);
    Some(buf.into_boxed_slice())
}
