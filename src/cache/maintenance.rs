//! Whole-store maintenance: flushing, expiry sweeps and disk census

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::entry::CacheEntry;
use crate::cache::store::{remove_quietly, CacheStore};
use crate::core::paths::{is_entry_file, is_temp_file, make_relative};
use crate::core::util::get_file_size;

/// Age after which a temp file is considered abandoned by its writer
pub const STALE_TEMP_SECS: i64 = 60;

/// On-disk footprint of one group directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCensus {
    /// Directory name relative to the base directory
    pub group: String,
    pub entries: usize,
    pub bytes: u64,
}

impl CacheStore {
    /// Drop the hot layer, reset counters and delete everything under the
    /// base directory. Returns true iff the base directory is empty afterwards.
    pub fn flush(&mut self) -> bool {
        self.flush_runtime();

        let removed = clear_dir(&self.base_dir);
        let empty = dir_is_empty(&self.base_dir);
        info!(base_dir = %self.base_dir.display(), removed, empty, "flushed cache");
        empty
    }

    /// Delete one group's entries, in memory and on disk
    pub fn flush_group(&mut self, group: &str) -> bool {
        let segment = self.segment(group);
        self.runtime.remove(&segment);

        let dir = self.base_dir.join(&segment);
        match fs::remove_dir_all(&dir) {
            Ok(()) => debug!(group = %segment, "flushed group"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(group = %segment, error = %e, "failed to remove group directory"),
        }
        true
    }

    /// Delete every expired or corrupt entry file, plus temp files abandoned
    /// for at least [`STALE_TEMP_SECS`]. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();

        for group in self.runtime.values_mut() {
            group.retain(|_, entry| !crate::cache::entry::is_expired(entry.expires, now));
        }

        let mut removed = 0;
        for entry in WalkDir::new(&self.base_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            if is_temp_file(path) {
                if modified_secs(path).is_some_and(|m| now - m >= STALE_TEMP_SECS) {
                    remove_quietly(path);
                    removed += 1;
                }
                continue;
            }

            if !is_entry_file(path) {
                continue;
            }

            let stale = match fs::read(path) {
                Ok(bytes) => match CacheEntry::parse(&bytes) {
                    Some(cached) => cached.is_expired(now),
                    None => true,
                },
                Err(_) => false,
            };

            if stale {
                remove_quietly(path);
                removed += 1;
            }
        }

        debug!(removed, "purged stale entries");
        removed
    }

    /// Count entry files and bytes per group directory, sorted by name
    pub fn census(&self) -> Vec<GroupCensus> {
        let mut groups = Vec::new();

        for dir in WalkDir::new(&self.base_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_dir())
        {
            let mut census = GroupCensus {
                group: make_relative(dir.path(), &self.base_dir).unwrap_or_default(),
                entries: 0,
                bytes: 0,
            };

            for file in WalkDir::new(dir.path())
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && is_entry_file(e.path()))
            {
                census.entries += 1;
                census.bytes += get_file_size(file.path()).unwrap_or(0);
            }

            groups.push(census);
        }

        groups
    }
}

/// Remove every child of `dir`, continuing past failures
fn clear_dir(dir: &Path) -> usize {
    let children = match fs::read_dir(dir) {
        Ok(children) => children,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %e, "failed to read cache directory");
            }
            return 0;
        }
    };

    let mut removed = 0;
    for child in children.filter_map(Result::ok) {
        let path = child.path();
        let is_dir = child.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let result = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove cache path"),
        }
    }
    removed
}

/// Modification time in epoch seconds
fn modified_secs(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

/// A missing directory counts as empty
fn dir_is_empty(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut children) => children.next().is_none(),
        Err(e) => e.kind() == ErrorKind::NotFound,
    }
}
