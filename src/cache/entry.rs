//! On-disk entry format
//!
//! Each entry file holds a single JSON object:
//!
//! ```text
//! {"key":"user:42","value":{...},"expires":1767225600}
//! ```
//!
//! `expires` is in seconds since the Unix epoch, `0` meaning never.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Expiration marker for entries that never expire
pub const NEVER: i64 = 0;

/// A persisted cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntry {
    /// Raw key, used to detect filename collisions
    pub key: String,

    /// Stored payload
    pub value: Value,

    /// Absolute expiration (epoch seconds), 0 = never
    pub expires: i64,
}

impl CacheEntry {
    pub fn new(key: &str, value: Value, expires: i64) -> Self {
        Self {
            key: key.to_string(),
            value,
            expires,
        }
    }

    /// Parse an entry, returning `None` for anything that is not a well-formed entry
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        is_expired(self.expires, now)
    }
}

/// Absolute expiration for a relative TTL, `NEVER` when the TTL is not positive
pub fn expires_at(now: i64, expire_secs: i64) -> i64 {
    if expire_secs > 0 {
        now.saturating_add(expire_secs)
    } else {
        NEVER
    }
}

/// An entry is expired once `now` reaches its expiration instant
pub fn is_expired(expires: i64, now: i64) -> bool {
    expires != NEVER && expires <= now
}
