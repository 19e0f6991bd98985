//! lrukit: LRU tracking and budgeted caching over a bucket-ordered LRU list.
//!
//! Two in-process cache structures built on one machine — a hash table whose
//! LRU list orders bucket rows (not items) and an index-addressed item pool:
//!
//! - [`LruTracker`]: unbounded tagged key set; the caller evicts the least
//!   recently used bucket cohort on demand.
//! - [`SizedLruCache`]: consumption-budgeted cache; overflowing inserts
//!   evict cohorts automatically until the entry fits.
//!
//! Values leave a cache only through its [`EvictionSink`], exactly once.

pub mod config;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod traits;

pub use config::{SizedLruConfig, TrackerConfig};
pub use error::{ConfigError, CreateError, InsertError};
pub use policy::{LruTracker, SizedLruCache};
pub use traits::EvictionSink;
