//! # Configuration
//!
//! Stash configuration is managed by [`confique`], which handles layered
//! loading from environment variables and TOML files.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `STASH_FAULTS_ENABLED`, `STASH_MAX_PAGE_SIZE`, etc.
//! 2. **Explicit file**: the path given with `--config` (must exist).
//! 3. **Global Config**: `stash.toml` in the OS config directory (via `directories`).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `faults.enabled` | `false` | Turn on the fault harness |
//! | `faults.error_rate` | `0.0` | Probability of a simulated `service_unavailable` |
//! | `faults.delay_min_ms` / `delay_max_ms` | `0` / `0` | Latency range per operation |
//! | `faults.seed` | none | Fixed RNG seed for reproducible faults |
//! | `query.default_page_size` | `20` | Page size when the caller gives none |
//! | `query.max_page_size` | `100` | Larger requested sizes are clamped |
//! | `folders.path_separator` | `/` | Joins folder names into paths |
//! | `auth.email` / `auth.password` | demo pair | Credentials accepted by `login` |
//! | `auth.token_ttl_minutes` | `60` | Lifetime of issued tokens |

use confique::Config;
use directories::ProjectDirs;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, StashError};

/// Configuration for stash, stored in `stash.toml`.
#[derive(Config, Serialize, Debug, Clone, PartialEq)]
pub struct StashConfig {
    #[config(nested)]
    pub faults: FaultConfig,

    #[config(nested)]
    pub query: QueryConfig,

    #[config(nested)]
    pub folders: FolderConfig,

    #[config(nested)]
    pub auth: AuthConfig,
}

#[derive(Config, Serialize, Debug, Clone, PartialEq)]
pub struct FaultConfig {
    /// Inject latency and simulated outages before every operation.
    #[config(default = false, env = "STASH_FAULTS_ENABLED")]
    pub enabled: bool,

    /// Probability (0.0 to 1.0) that an operation fails with `service_unavailable`.
    #[config(default = 0.0, env = "STASH_FAULTS_ERROR_RATE")]
    pub error_rate: f64,

    /// Lower bound of the simulated latency, in milliseconds.
    #[config(default = 0, env = "STASH_FAULTS_DELAY_MIN_MS")]
    pub delay_min_ms: u64,

    /// Upper bound of the simulated latency. Equal bounds give a fixed delay.
    #[config(default = 0, env = "STASH_FAULTS_DELAY_MAX_MS")]
    pub delay_max_ms: u64,

    /// Seed for the fault RNG; random when absent.
    #[config(env = "STASH_FAULTS_SEED")]
    pub seed: Option<u64>,
}

#[derive(Config, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    #[config(default = 20, env = "STASH_DEFAULT_PAGE_SIZE")]
    pub default_page_size: usize,

    #[config(default = 100, env = "STASH_MAX_PAGE_SIZE")]
    pub max_page_size: usize,
}

#[derive(Config, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FolderConfig {
    #[config(default = "/", env = "STASH_PATH_SEPARATOR")]
    pub path_separator: String,
}

#[derive(Config, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    #[config(default = "maya@stash.dev", env = "STASH_AUTH_EMAIL")]
    pub email: String,

    #[config(default = "stash-demo", env = "STASH_AUTH_PASSWORD")]
    #[serde(skip_serializing)]
    pub password: String,

    #[config(default = 60, env = "STASH_TOKEN_TTL_MINUTES")]
    pub token_ttl_minutes: i64,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            faults: FaultConfig::default(),
            query: QueryConfig::default(),
            folders: FolderConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            error_rate: 0.0,
            delay_min_ms: 0,
            delay_max_ms: 0,
            seed: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            path_separator: "/".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "maya@stash.dev".to_string(),
            password: "stash-demo".to_string(),
            token_ttl_minutes: 60,
        }
    }
}

impl StashConfig {
    /// Loads the layered configuration.
    ///
    /// `explicit` must point at an existing file; the global file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = StashConfig::builder().env();
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(StashError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            // Explicit files are TOML whatever their extension.
            let layer = confique::File::with_format(path, confique::FileFormat::Toml)
                .required()
                .load()
                .map_err(|e| StashError::Config(e.to_string()))?;
            builder = builder.preloaded(layer);
        }
        if let Some(global) = global_config_path() {
            builder = builder.file(global);
        }

        let config = builder
            .load()
            .map_err(|e| StashError::Config(e.to_string()))?;
        config.validate()?;
        tracing::debug!(
            faults = config.faults.enabled,
            max_page_size = config.query.max_page_size,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let f = &self.faults;
        if !(0.0..=1.0).contains(&f.error_rate) {
            return Err(StashError::Config(format!(
                "faults.error_rate must be between 0 and 1, got {}",
                f.error_rate
            )));
        }
        if f.delay_min_ms > f.delay_max_ms {
            return Err(StashError::Config(format!(
                "faults.delay_min_ms ({}) exceeds faults.delay_max_ms ({})",
                f.delay_min_ms, f.delay_max_ms
            )));
        }
        let q = &self.query;
        if q.default_page_size == 0 || q.max_page_size == 0 {
            return Err(StashError::Config("page sizes must be at least 1".into()));
        }
        if q.default_page_size > q.max_page_size {
            return Err(StashError::Config(format!(
                "query.default_page_size ({}) exceeds query.max_page_size ({})",
                q.default_page_size, q.max_page_size
            )));
        }
        if self.folders.path_separator.is_empty() {
            return Err(StashError::Config("folders.path_separator cannot be empty".into()));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(StashError::Config("auth.token_ttl_minutes must be positive".into()));
        }
        Ok(())
    }

    /// A commented sample `stash.toml`.
    pub fn template() -> String {
        confique::toml::template::<StashConfig>(confique::toml::FormatOptions::default())
    }
}

/// `stash.toml` in the OS-appropriate config directory.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "stash", "stash").map(|dirs| dirs.config_dir().join("stash.toml"))
}
