//! Buffer cache (L3, §4.6) and table-level record storage (L5, §4.7) for
//! the single-file heap. Colocated in one crate because `TableStore` is
//! the cache's only real consumer in this design, and `storage` cannot
//! depend back on this crate.

mod cache;
mod table_store;

pub use cache::{BufferCache, CacheStats, EvictionLogEntry};
pub use table_store::TableStore;
