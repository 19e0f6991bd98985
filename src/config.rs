//! Construction parameters for the cache types.
//!
//! Plain structs with public fields and a `validate()` step; the `try_new`
//! constructors call `validate()` and surface violations as
//! [`ConfigError`](crate::error::ConfigError) before touching the allocator.
//!
//! Both tables require a power-of-two `hash_table_size` because bucket
//! selection reduces the hash with a stored `size - 1` mask.

use crate::error::ConfigError;

/// Construction parameters for [`LruTracker`](crate::policy::LruTracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Number of hash buckets; must be a nonzero power of two.
    pub hash_table_size: u32,
    /// Item slots preallocated at construction. Zero defers the first
    /// allocation to the first insert, which grows the pool to
    /// `hash_table_size` slots.
    pub num_initial_items: u32,
    /// Seed mixed into every key hash.
    pub hash_seed: u32,
    /// Sentinel marking unused slots; inserting this value is rejected.
    /// Choose a value that never collides with real values.
    pub invalid_value: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            hash_table_size: 256,
            num_initial_items: 0,
            hash_seed: 0,
            invalid_value: 0,
        }
    }
}

impl TrackerConfig {
    /// Checks every parameter, returning a description of the first
    /// violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hash_table_size(self.hash_table_size)
    }
}

/// Construction parameters for
/// [`SizedLruCache`](crate::policy::SizedLruCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedLruConfig {
    /// Number of hash buckets; must be a nonzero power of two.
    pub hash_table_size: u32,
    /// Item slots preallocated at construction; zero defers to first insert.
    pub num_initial_items: u32,
    /// Seed mixed into every key hash.
    pub hash_seed: u32,
    /// Total consumption budget; must be nonzero.
    pub cache_size: u32,
}

impl Default for SizedLruConfig {
    fn default() -> Self {
        Self {
            hash_table_size: 256,
            num_initial_items: 0,
            hash_seed: 0,
            cache_size: 1024,
        }
    }
}

impl SizedLruConfig {
    /// Checks every parameter, returning a description of the first
    /// violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hash_table_size(self.hash_table_size)?;
        if self.cache_size == 0 {
            return Err(ConfigError::new("cache_size must be nonzero"));
        }
        Ok(())
    }
}

fn validate_hash_table_size(size: u32) -> Result<(), ConfigError> {
    if !size.is_power_of_two() {
        return Err(ConfigError::new(format!(
            "hash_table_size must be a nonzero power of two, got {size}"
        )));
    }
    Ok(())
}
