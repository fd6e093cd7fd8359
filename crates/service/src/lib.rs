//! Per-player record storage for the game engine.
//! - `storage`: keyed lock, cache tier, file store and the cache-aside accessor.
//! - `skill` / `talent`: modules built on it, every operation lock-guarded per player.
//! - `catalog`: read-only item definitions used by skill recompute.

pub mod errors;
pub mod storage;
pub mod lookup;
pub mod skill;
pub mod talent;
pub mod catalog;
pub mod runtime;

pub use errors::ServiceError;
