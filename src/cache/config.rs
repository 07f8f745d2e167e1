//! Cache configuration

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::core::paths::default_base_dir;

/// Environment variable overriding the base directory
pub const ENV_DIR: &str = "FILECACHE_DIR";

/// Environment variable carrying the tenant prefix
pub const ENV_TENANT: &str = "FILECACHE_TENANT";

/// Configuration for a [`CacheStore`](crate::CacheStore)
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory holding one subdirectory per group
    pub base_dir: PathBuf,
    /// Namespace prefix applied to non-global groups (empty = single tenant)
    pub tenant_prefix: String,
    /// Groups shared by every tenant
    pub global_groups: BTreeSet<String>,
    /// Groups kept in memory only
    pub non_persistent_groups: BTreeSet<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            tenant_prefix: String::new(),
            global_groups: BTreeSet::new(),
            non_persistent_groups: BTreeSet::new(),
        }
    }
}

impl CacheConfig {
    /// Config rooted at the given directory, everything else default
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `FILECACHE_DIR` and `FILECACHE_TENANT`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(ENV_DIR).filter(|d| !d.is_empty()) {
            config.base_dir = PathBuf::from(dir);
        }
        if let Ok(tenant) = std::env::var(ENV_TENANT) {
            config.tenant_prefix = tenant;
        }
        config
    }

    pub fn tenant(mut self, prefix: impl Into<String>) -> Self {
        self.tenant_prefix = prefix.into();
        self
    }

    pub fn global_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn non_persistent_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_persistent_groups
            .extend(groups.into_iter().map(Into::into));
        self
    }
}
