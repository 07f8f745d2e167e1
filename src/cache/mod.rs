//! Cache module - the filesystem-backed object cache
//!
//! Provides:
//! - Cache store (hot layer + one file per key)
//! - Entry file format
//! - Bulk and maintenance operations
//! - Store configuration

pub mod bulk;
pub mod config;
pub mod entry;
pub mod maintenance;
pub mod store;
