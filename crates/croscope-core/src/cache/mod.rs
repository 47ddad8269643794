//! Cache layer: an in-memory store with an optional shared backing store.

mod memory;
mod tiered;

pub use memory::MemoryCache;
pub use tiered::TieredCache;
