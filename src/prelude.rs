pub use crate::config::{SizedLruConfig, TrackerConfig};
pub use crate::ds::{BucketLru, BucketTable, ItemArena, NONE};
pub use crate::error::{ConfigError, CreateError, InsertError};
pub use crate::policy::{LruTracker, SizedLruCache};
pub use crate::traits::EvictionSink;
