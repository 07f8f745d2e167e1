//! Enable/disable a store as the host's active cache

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::cache::store::CacheStore;
use crate::host::dropin::{CacheHost, DropIn};

const PROBE_FILE: &str = ".filecache-probe";

/// Binds a [`CacheHost`] to the stores it activates
#[derive(Debug, Clone)]
pub struct Activation<H: CacheHost> {
    host: H,
}

impl<H: CacheHost> Activation<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Install `store` as the active cache and clear it.
    ///
    /// Fails with a descriptive error when the cache directory is not writable.
    pub fn enable(&self, store: &mut CacheStore) -> Result<()> {
        ensure_writable(store.base_dir())?;
        self.host.install(&DropIn::new(store.base_dir()))?;

        if !store.flush() {
            warn!(base_dir = %store.base_dir().display(), "cache directory not empty after flush");
        }
        info!(base_dir = %store.base_dir().display(), "enabled file cache");
        Ok(())
    }

    /// Hand the active-cache role back to the host and clear the store
    pub fn disable(&self, store: &mut CacheStore) -> Result<()> {
        if !store.flush() {
            warn!(base_dir = %store.base_dir().display(), "cache directory not empty after flush");
        }
        let removed = self.host.uninstall()?;
        info!(removed, "disabled file cache");
        Ok(())
    }

    /// Whether the host's active cache is this store
    pub fn is_active(&self, store: &CacheStore) -> bool {
        self.host
            .installed()
            .map(|d| d.is_ours() && d.base_dir == store.base_dir())
            .unwrap_or(false)
    }
}

/// Verify the directory exists and accepts writes
fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cache directory {:?} cannot be created", dir))?;

    let probe = dir.join(PROBE_FILE);
    fs::write(&probe, b"probe")
        .with_context(|| format!("Cache directory {:?} is not writable", dir))?;
    fs::remove_file(&probe)
        .with_context(|| format!("Cache directory {:?} does not allow deletes", dir))?;
    Ok(())
}
