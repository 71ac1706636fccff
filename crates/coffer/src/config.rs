use std::path::{Path, PathBuf};

use coffer_store::SyncMode;
use serde::{Deserialize, Serialize};

use crate::error::{ChestError, ChestResult};

/// Where and how chests are stored.
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes:
///
/// ```toml
/// root = "/var/lib/app/coffer"
/// cache_capacity = 500
/// sync_mode = "every_write"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CofferConfig {
    /// Directory holding one subdirectory per chest.
    pub root: PathBuf,
    /// Decoded values kept in memory per chest. Zero disables the cache.
    pub cache_capacity: usize,
    pub sync_mode: SyncMode,
}

impl CofferConfig {
    pub const DEFAULT_CACHE_CAPACITY: usize = 100;

    /// Default settings rooted at `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> ChestResult<Self> {
        toml::from_str(text).map_err(|e| ChestError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> ChestResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChestError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ChestResult<String> {
        toml::to_string(self).map_err(|e| ChestError::Config(e.to_string()))
    }
}

impl Default for CofferConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("coffer"),
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
            sync_mode: SyncMode::default(),
        }
    }
}
