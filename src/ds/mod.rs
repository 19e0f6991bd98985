pub mod bucket_lru;
pub mod bucket_table;
pub mod hash;
pub mod item_arena;

pub use bucket_lru::BucketLru;
pub use bucket_table::BucketTable;
pub use item_arena::{ItemArena, ItemSlot};

/// Reserved all-ones index meaning "none": no item, no bucket, end of chain.
pub const NONE: u32 = u32::MAX;
