//! Storage building blocks shared by every per-player module.
//!
//! - [`keyed_lock`]: per-key mutual exclusion for guarded operations
//! - [`cache_tier`]: pluggable, non-authoritative cache of serialized records
//! - [`file_store`]: durable JSON files with atomic replacement
//! - [`entity_store`]: cache-aside accessor composing the two tiers

pub mod cache_tier;
pub mod entity_store;
pub mod file_store;
pub mod keyed_lock;

pub use cache_tier::{CacheTier, MokaCacheTier, NoopCacheTier};
pub use entity_store::EntityStore;
pub use file_store::{FileStore, PathScheme};
pub use keyed_lock::{KeyedLock, KeyedLockGuard};
