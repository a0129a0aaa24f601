//! Configuration for kvrows.
//!
//! KVROWS_ROOT resolution order:
//! 1. Explicit path passed to Config::with_root()
//! 2. KVROWS_ROOT environment variable
//! 3. Default: platform data dir, falling back to ~/.local/share/kvrows

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable holding the access token for managed (`md:`) stores.
pub const ACCESS_TOKEN_VAR: &str = "KVROWS_ACCESS_TOKEN";

/// Environment variable overriding the data/config root.
pub const ROOT_VAR: &str = "KVROWS_ROOT";

/// kvrows configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding config.toml and the local default store.
    #[serde(default)]
    pub root: PathBuf,

    /// Store URL used when none is given on the command line.
    #[serde(default)]
    pub default_url: Option<String>,

    /// Number of entries fetched per page while listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Table cells longer than this many characters are truncated.
    #[serde(default = "default_max_cell_width")]
    pub max_cell_width: usize,
}

fn default_page_size() -> usize {
    100
}

fn default_max_cell_width() -> usize {
    48
}

impl Config {
    /// Create a new config with the given root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_url: None,
            page_size: default_page_size(),
            max_cell_width: default_max_cell_width(),
        }
    }

    /// Load config from KVROWS_ROOT/config.toml, or fall back to defaults.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        Self::load_from(&root)
    }

    /// Load config from a specific root.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            config.root = root.to_path_buf();
            if config.page_size == 0 {
                return Err(Error::Config("page_size must be at least 1".to_string()));
            }
            Ok(config)
        } else {
            Ok(Self::with_root(root))
        }
    }

    /// Save config to KVROWS_ROOT/config.toml.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(self.config_path(), contents)?;
        Ok(())
    }

    /// Path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Path to the local default store.
    pub fn local_store_path(&self) -> PathBuf {
        self.root.join("kv.duckdb")
    }
}

/// Resolve KVROWS_ROOT using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ROOT_VAR) {
        return Ok(PathBuf::from(path));
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "kvrows") {
        return Ok(proj_dirs.data_dir().to_path_buf());
    }

    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".local/share/kvrows"))
}
