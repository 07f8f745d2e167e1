//! filecache - A filesystem-backed object cache
//!
//! filecache provides:
//! - get/set/add/replace/delete and counters, namespaced by group
//! - Per-entry expiration, enforced on read
//! - An in-memory hot layer over one JSON file per key
//! - Bulk operations and whole-store maintenance
//! - A drop-in activation hook for hosts that swap cache implementations

pub mod cache;
pub mod core;
mod error;
pub mod host;

pub use crate::cache::bulk::BulkResult;
pub use crate::cache::config::CacheConfig;
pub use crate::cache::entry::CacheEntry;
pub use crate::cache::maintenance::GroupCensus;
pub use crate::cache::store::{default_store, CacheStats, CacheStore};
pub use crate::core::util::{Clock, ManualClock, SystemClock};
pub use crate::error::{CacheError, CacheResult};
pub use crate::host::{Activation, CacheHost, DropIn, DropInHost};
