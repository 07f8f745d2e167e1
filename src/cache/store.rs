//! Cache store - hot in-memory layer over one-file-per-key persistence
//!
//! ```text
//! <base_dir>/
//!   <group>/
//!     cache_<sanitized-key>-<xxh3>.cache
//! ```
//!
//! Reads go to the hot layer first and fall back to the entry file. Writes
//! always update the hot layer and then replace the entry file. Malformed or
//! expired entry files are deleted by the first read that notices them.

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::cache::config::CacheConfig;
use crate::cache::entry::{expires_at, is_expired, CacheEntry};
use crate::core::paths::{entry_file_name, group_segment, temp_file_for};
use crate::core::util::{numeric_value, Clock, SystemClock};
use crate::error::{CacheError, CacheResult};

/// Optional operations a store can advertise to its host
pub const SUPPORTED_FEATURES: &[&str] = &[
    "add_multiple",
    "set_multiple",
    "get_multiple",
    "delete_multiple",
    "flush_runtime",
    "flush_group",
];

/// A value held in the hot layer together with its expiration
#[derive(Debug, Clone)]
pub(crate) struct HotEntry {
    pub(crate) value: Value,
    pub(crate) expires: i64,
}

/// Hit/miss counters and hot-layer size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub runtime_groups: usize,
    pub runtime_entries: usize,
}

/// Filesystem-backed object cache
pub struct CacheStore {
    pub(crate) base_dir: PathBuf,
    pub(crate) tenant_prefix: String,
    pub(crate) global_groups: BTreeSet<String>,
    pub(crate) non_persistent_groups: BTreeSet<String>,
    /// Hot layer, keyed by group directory segment then raw key
    pub(crate) runtime: HashMap<String, HashMap<String, HotEntry>>,
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) clock: Arc<dyn Clock>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("base_dir", &self.base_dir)
            .field("tenant_prefix", &self.tenant_prefix)
            .field("global_groups", &self.global_groups)
            .field("non_persistent_groups", &self.non_persistent_groups)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

static DEFAULT_STORE: OnceCell<Mutex<CacheStore>> = OnceCell::new();

/// Sequence number keeping concurrent temp files within a process apart
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Process-wide store, opened on first use from [`CacheConfig::from_env`]
pub fn default_store() -> CacheResult<&'static Mutex<CacheStore>> {
    DEFAULT_STORE.get_or_try_init(|| CacheStore::open(CacheConfig::from_env()).map(Mutex::new))
}

impl CacheStore {
    /// Open a store, creating the base directory if needed.
    ///
    /// This is the only operation that fails hard: without a usable base
    /// directory there is nothing to fall back on.
    pub fn open(config: CacheConfig) -> CacheResult<Self> {
        fs::create_dir_all(&config.base_dir).map_err(|source| CacheError::BaseDir {
            path: config.base_dir.clone(),
            source,
        })?;

        debug!(
            base_dir = %config.base_dir.display(),
            tenant = %config.tenant_prefix,
            "opened cache store"
        );

        Ok(Self {
            base_dir: config.base_dir,
            tenant_prefix: config.tenant_prefix,
            global_groups: config.global_groups,
            non_persistent_groups: config.non_persistent_groups,
            runtime: HashMap::new(),
            hits: 0,
            misses: 0,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for expiration
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn tenant_prefix(&self) -> &str {
        &self.tenant_prefix
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            runtime_groups: self.runtime.len(),
            runtime_entries: self.runtime.values().map(HashMap::len).sum(),
        }
    }

    /// Whether the store implements an optional operation
    pub fn supports(&self, feature: &str) -> bool {
        SUPPORTED_FEATURES.contains(&feature)
    }

    /// Mark groups as shared across tenants
    pub fn add_global_groups<I, S>(&mut self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_groups
            .extend(groups.into_iter().map(Into::into));
    }

    /// Mark groups as memory-only
    pub fn add_non_persistent_groups<I, S>(&mut self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_persistent_groups
            .extend(groups.into_iter().map(Into::into));
    }

    /// Change the tenant prefix used for non-global groups
    pub fn switch_tenant(&mut self, prefix: impl Into<String>) {
        self.tenant_prefix = prefix.into();
        debug!(tenant = %self.tenant_prefix, "switched tenant");
    }

    pub fn is_persistent(&self, group: &str) -> bool {
        !self.non_persistent_groups.contains(group)
    }

    /// Directory segment for a group under the current tenant
    pub(crate) fn segment(&self, group: &str) -> String {
        if self.global_groups.contains(group) {
            group_segment(group, None)
        } else {
            group_segment(group, Some(&self.tenant_prefix))
        }
    }

    /// Directory holding a group's entry files
    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.base_dir.join(self.segment(group))
    }

    /// Backing file of `(group, key)`
    pub fn path_for(&self, key: &str, group: &str) -> PathBuf {
        self.group_dir(group).join(entry_file_name(key))
    }

    /// Look up a key, preferring the hot layer
    pub fn get(&mut self, key: &str, group: &str) -> Option<Value> {
        self.get_with(key, group, false)
    }

    /// Look up a key; with `force` the hot layer is bypassed and the entry
    /// file is re-read.
    pub fn get_with(&mut self, key: &str, group: &str, force: bool) -> Option<Value> {
        let segment = self.segment(group);
        let now = self.clock.now();
        let persistent = self.is_persistent(group);

        if !force || !persistent {
            if let Some(value) = self.hot_lookup(&segment, key, now) {
                self.hits += 1;
                debug!(key, group = %segment, "hot cache hit");
                return Some(value);
            }
        }

        if !persistent {
            self.misses += 1;
            return None;
        }

        let path = self.base_dir.join(&segment).join(entry_file_name(key));
        match load_entry(&path, key, now) {
            Some(entry) => {
                self.hot_insert(&segment, key, entry.value.clone(), entry.expires);
                self.hits += 1;
                debug!(key, group = %segment, "file cache hit");
                Some(entry.value)
            }
            None => {
                self.hot_remove(&segment, key);
                self.misses += 1;
                debug!(key, group = %segment, "cache miss");
                None
            }
        }
    }

    /// Look up a key and deserialize it into `T`
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str, group: &str) -> Option<T> {
        self.get(key, group)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Store a value. `expire_secs <= 0` means the entry never expires.
    ///
    /// The hot layer is updated even when persisting fails, so a `false`
    /// return can still leave the value visible to this process.
    pub fn set(
        &mut self,
        key: &str,
        data: impl Into<Value>,
        group: &str,
        expire_secs: i64,
    ) -> bool {
        let value = data.into();
        let segment = self.segment(group);
        let expires = expires_at(self.clock.now(), expire_secs);

        self.hot_insert(&segment, key, value.clone(), expires);

        if !self.is_persistent(group) {
            return true;
        }

        let path = self.base_dir.join(&segment).join(entry_file_name(key));
        match persist_entry(&path, &CacheEntry::new(key, value, expires)) {
            Ok(()) => {
                debug!(key, group = %segment, expires, "stored entry");
                true
            }
            Err(e) => {
                warn!(
                    key,
                    group = %segment,
                    path = %path.display(),
                    error = %e,
                    "failed to persist entry"
                );
                false
            }
        }
    }

    /// Serialize `data` and store it
    pub fn set_as<T: Serialize>(
        &mut self,
        key: &str,
        data: &T,
        group: &str,
        expire_secs: i64,
    ) -> bool {
        match serde_json::to_value(data) {
            Ok(value) => self.set(key, value, group, expire_secs),
            Err(e) => {
                warn!(key, group, error = %e, "failed to serialize value");
                false
            }
        }
    }

    /// Store only if the key is currently absent
    pub fn add(
        &mut self,
        key: &str,
        data: impl Into<Value>,
        group: &str,
        expire_secs: i64,
    ) -> bool {
        if self.get(key, group).is_some() {
            return false;
        }
        self.set(key, data, group, expire_secs)
    }

    /// Store only if the key is currently present
    pub fn replace(
        &mut self,
        key: &str,
        data: impl Into<Value>,
        group: &str,
        expire_secs: i64,
    ) -> bool {
        if self.get(key, group).is_none() {
            return false;
        }
        self.set(key, data, group, expire_secs)
    }

    /// Remove a key. Returns true only if an entry file was removed
    /// (or, for memory-only groups, a hot entry).
    pub fn delete(&mut self, key: &str, group: &str) -> bool {
        let segment = self.segment(group);
        let was_hot = self.hot_remove(&segment, key);

        if !self.is_persistent(group) {
            return was_hot;
        }

        let path = self.base_dir.join(&segment).join(entry_file_name(key));
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, group = %segment, "deleted entry");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(key, group = %segment, error = %e, "failed to delete entry");
                false
            }
        }
    }

    /// Add `offset` to a numeric entry, clamping at zero.
    ///
    /// Non-numeric values count as zero. The result is stored without an
    /// expiration. Returns `None` when the key is absent.
    pub fn incr(&mut self, key: &str, offset: i64, group: &str) -> Option<i64> {
        let current = self.get(key, group)?;
        let next = numeric_value(&current).saturating_add(offset).max(0);
        self.set(key, next, group, 0);
        Some(next)
    }

    pub fn decr(&mut self, key: &str, offset: i64, group: &str) -> Option<i64> {
        self.incr(key, offset.saturating_neg(), group)
    }

    /// Drop the hot layer and reset counters, leaving entry files alone
    pub fn flush_runtime(&mut self) -> bool {
        self.runtime.clear();
        self.hits = 0;
        self.misses = 0;
        true
    }

    fn hot_lookup(&mut self, segment: &str, key: &str, now: i64) -> Option<Value> {
        let group = self.runtime.get_mut(segment)?;
        let entry = group.get(key)?;
        if is_expired(entry.expires, now) {
            group.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn hot_insert(&mut self, segment: &str, key: &str, value: Value, expires: i64) {
        self.runtime
            .entry(segment.to_string())
            .or_default()
            .insert(key.to_string(), HotEntry { value, expires });
    }

    fn hot_remove(&mut self, segment: &str, key: &str) -> bool {
        self.runtime
            .get_mut(segment)
            .and_then(|group| group.remove(key))
            .is_some()
    }
}

/// Read and validate an entry file.
///
/// Corrupt and expired files are deleted; a file holding a different raw key
/// is left alone and reported as absent.
pub(crate) fn load_entry(path: &Path, key: &str, now: i64) -> Option<CacheEntry> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read entry");
            return None;
        }
    };

    let entry = match CacheEntry::parse(&bytes) {
        Some(entry) => entry,
        None => {
            warn!(path = %path.display(), "discarding corrupt entry");
            remove_quietly(path);
            return None;
        }
    };

    if entry.key != key {
        debug!(
            path = %path.display(),
            stored = %entry.key,
            requested = key,
            "entry belongs to another key"
        );
        return None;
    }

    if entry.is_expired(now) {
        debug!(path = %path.display(), expires = entry.expires, "entry expired");
        remove_quietly(path);
        return None;
    }

    Some(entry)
}

/// Write an entry via a temp file and rename, creating the group directory
fn persist_entry(path: &Path, entry: &CacheEntry) -> CacheResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let bytes = entry.to_bytes()?;
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_path = temp_file_for(path, std::process::id(), seq);
    fs::write(&temp_path, bytes)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        remove_quietly(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

pub(crate) fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove file");
        }
    }
}
