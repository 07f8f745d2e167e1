//! Path derivation for cache entries
//!
//! Keys and group names are reduced to `[A-Za-z0-9_-]` before they touch the
//! filesystem. Entry filenames carry a hash of the raw key and group
//! directories a hash of the raw tenant and group, so names differing only in
//! disallowed characters still land in distinct places.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::core::util::hash_bytes;

/// Fixed prefix of every entry filename
pub const ENTRY_PREFIX: &str = "cache_";

/// Extension of every entry filename
pub const ENTRY_EXTENSION: &str = "cache";

/// Extension prefix of in-flight temp files
const TEMP_EXTENSION_PREFIX: &str = "tmp";

/// Group used when the caller passes an empty group name
pub const DEFAULT_GROUP: &str = "default";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("Invalid UNSAFE_CHARS regex"));

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize(raw: &str) -> String {
    UNSAFE_CHARS.replace_all(raw, "_").into_owned()
}

/// Directory segment for a group, optionally namespaced by a tenant prefix.
///
/// `<sanitized tenant+group>-<xxh3>` where the hash covers the raw group, and
/// the raw tenant followed by a NUL separator when a tenant is set.
pub fn group_segment(group: &str, tenant_prefix: Option<&str>) -> String {
    let group = if group.is_empty() { DEFAULT_GROUP } else { group };
    let (name, hashed) = match tenant_prefix {
        Some(prefix) if !prefix.is_empty() => (
            format!("{}{}", prefix, group),
            format!("{}\0{}", prefix, group),
        ),
        _ => (group.to_string(), group.to_string()),
    };
    format!("{}-{}", sanitize(&name), hash_bytes(hashed.as_bytes()))
}

/// Filename for a key: `cache_<sanitized>-<xxh3>.cache`
pub fn entry_file_name(key: &str) -> String {
    format!(
        "{}{}-{}.{}",
        ENTRY_PREFIX,
        sanitize(key),
        hash_bytes(key.as_bytes()),
        ENTRY_EXTENSION
    )
}

/// Temp file for an in-flight write of `path`, unique per process and write
pub fn temp_file_for(path: &Path, pid: u32, seq: u64) -> PathBuf {
    path.with_extension(format!("{}{}-{}", TEMP_EXTENSION_PREFIX, pid, seq))
}

/// Check whether a path is a temp file left by [`temp_file_for`]
pub fn is_temp_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(ENTRY_PREFIX))
        .unwrap_or(false);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.starts_with(TEMP_EXTENSION_PREFIX))
        .unwrap_or(false);
    named && extension
}

/// Check whether a filename looks like a cache entry
pub fn is_entry_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(ENTRY_PREFIX))
        .unwrap_or(false);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == ENTRY_EXTENSION)
        .unwrap_or(false);
    named && extension
}

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the base directory
pub fn make_relative(path: &Path, base: &Path) -> Option<String> {
    path.strip_prefix(base).ok().map(normalize_path)
}

/// Default base directory when none is configured
pub fn default_base_dir() -> PathBuf {
    std::env::temp_dir().join("filecache")
}
