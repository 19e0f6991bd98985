//! Error types for the lrukit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when construction parameters are invalid
//!   (e.g. non-power-of-two hash table size, zero cache budget).
//! - [`CreateError`]: Returned by `try_new` constructors; invalid
//!   configuration or allocation failure while preallocating.
//! - [`InsertError`]: Returned by the insert operations; boundary
//!   validation, allocation failure, or a budget that cannot fit the entry.
//!
//! Absence is never an error: lookups return `Option`, removals return
//! `bool`.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when construction parameters are invalid.
///
/// Carries a human-readable description of which parameter failed
/// validation.
///
/// # Example
///
/// ```
/// use lrukit::config::TrackerConfig;
///
/// let err = TrackerConfig {
///     hash_table_size: 100, // not a power of two
///     ..TrackerConfig::default()
/// }
/// .validate()
/// .unwrap_err();
/// assert!(err.to_string().contains("power of two"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// CreateError
// ---------------------------------------------------------------------------

/// Error returned by the fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    /// A construction parameter failed validation.
    Config(ConfigError),
    /// Preallocation of the internal arrays failed.
    OutOfMemory,
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => err.fmt(f),
            Self::OutOfMemory => f.write_str("allocation failed during construction"),
        }
    }
}

impl std::error::Error for CreateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::OutOfMemory => None,
        }
    }
}

impl From<ConfigError> for CreateError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

// ---------------------------------------------------------------------------
// InsertError
// ---------------------------------------------------------------------------

/// Error returned by the insert operations.
///
/// The cache remains valid and usable after every variant. `OutOfMemory`
/// leaves the cache exactly as it was before the call; `DoesntFit` is
/// returned only after the eviction loop has emptied the cache, so prior
/// evictions remain visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// Key is empty or longer than the module's key-length limit.
    InvalidKey,
    /// Value equals the configured invalid-value sentinel.
    ReservedValue,
    /// Allocating the key copy or growing the item pool failed.
    OutOfMemory,
    /// The entry's consumption exceeds the total budget; everything
    /// evictable has already been evicted.
    DoesntFit,
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidKey => "key is empty or exceeds the key-length limit",
            Self::ReservedValue => "value collides with the invalid-value sentinel",
            Self::OutOfMemory => "allocation failed; cache unchanged",
            Self::DoesntFit => "entry consumption exceeds the cache budget",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for InsertError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
