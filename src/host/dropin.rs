//! Drop-in marker management

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Provider name recorded in drop-ins written by this crate
pub const PROVIDER: &str = "filecache";

/// Drop-in file name inside the host directory
pub const DROP_IN_FILE: &str = "object-cache.json";

/// Contents of an installed drop-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIn {
    pub provider: String,
    pub version: String,
    pub base_dir: PathBuf,
    pub installed_at: DateTime<Utc>,
}

impl DropIn {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            provider: PROVIDER.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            base_dir: base_dir.to_path_buf(),
            installed_at: Utc::now(),
        }
    }

    pub fn is_ours(&self) -> bool {
        self.provider == PROVIDER
    }
}

/// The host side of cache activation
pub trait CacheHost {
    /// Make `drop_in` the active cache implementation
    fn install(&self, drop_in: &DropIn) -> Result<()>;

    /// Revert to the host's default cache. Returns whether a drop-in was removed.
    fn uninstall(&self) -> Result<bool>;

    /// Currently installed drop-in, if any
    fn installed(&self) -> Option<DropIn>;
}

/// Host whose active cache is recorded as a marker file in a directory
#[derive(Debug, Clone)]
pub struct DropInHost {
    host_dir: PathBuf,
}

impl DropInHost {
    pub fn new(host_dir: impl Into<PathBuf>) -> Self {
        Self {
            host_dir: host_dir.into(),
        }
    }

    pub fn drop_in_path(&self) -> PathBuf {
        self.host_dir.join(DROP_IN_FILE)
    }
}

impl CacheHost for DropInHost {
    fn install(&self, drop_in: &DropIn) -> Result<()> {
        if let Some(existing) = self.installed() {
            if !existing.is_ours() {
                bail!(
                    "another object cache ({}) is installed at {:?}",
                    existing.provider,
                    self.drop_in_path()
                );
            }
        }

        fs::create_dir_all(&self.host_dir)
            .with_context(|| format!("Failed to create host directory: {:?}", self.host_dir))?;

        let json = serde_json::to_string_pretty(drop_in)?;
        fs::write(self.drop_in_path(), json)
            .with_context(|| format!("Failed to write drop-in: {:?}", self.drop_in_path()))?;

        debug!(path = %self.drop_in_path().display(), "installed drop-in");
        Ok(())
    }

    fn uninstall(&self) -> Result<bool> {
        match self.installed() {
            Some(existing) if existing.is_ours() => {}
            Some(existing) => {
                warn!(provider = %existing.provider, "leaving foreign drop-in in place");
                return Ok(false);
            }
            None => return Ok(false),
        }

        match fs::remove_file(self.drop_in_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove drop-in: {:?}", self.drop_in_path())),
        }
    }

    fn installed(&self) -> Option<DropIn> {
        let content = fs::read_to_string(self.drop_in_path()).ok()?;
        serde_json::from_str(&content).ok()
    }
}
