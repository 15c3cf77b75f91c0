pub mod manager;
pub mod store;

pub use manager::{CacheEntry, CacheManager};
pub use store::{CacheStore, MemoryCacheStore};
