//! # Context Setup
//!
//! Every client starts the same way: resolve the configuration, load the seed
//! snapshot into a fresh [`MemoryStore`] and hand both to a [`StashApi`].
//!
//! ## Resolution Flow
//!
//! 1. [`StashConfig::load`] layers env vars, the explicit file and the global
//!    `stash.toml` over compiled defaults.
//! 2. Callers may force the fault harness on (`--faults` on the CLI) without
//!    touching the config files.
//! 3. The seed is loaded from the compiled-in snapshot, or from a JSON file
//!    when `STASH_SEED_FILE` is set.
//! 4. Seed paths are written with `/`; with another separator configured every
//!    folder path is rebuilt before the first operation.

use crate::api::StashApi;
use crate::commands::folders::rebuild_all_paths;
use crate::config::StashConfig;
use crate::error::{Result, StashError};
use crate::store::memory::MemoryStore;
use crate::store::{DataStore, Seed};
use std::path::Path;

pub struct StashContext {
    pub api: StashApi<MemoryStore>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions<'a> {
    pub config_path: Option<&'a Path>,
    pub force_faults: bool,
}

/// Loads configuration and seed data and builds the API.
pub fn initialize(options: InitOptions<'_>) -> Result<StashContext> {
    let mut config = StashConfig::load(options.config_path)?;
    if options.force_faults {
        config.faults.enabled = true;
    }
    let seed = load_seed()?;
    with_config(config, &seed)
}

/// Builds a context from an already resolved configuration.
pub fn with_config(config: StashConfig, seed: &Seed) -> Result<StashContext> {
    let mut store = MemoryStore::from_seed(seed)?;
    let sep = config.folders.path_separator.as_str();
    if sep != "/" {
        let rewritten = rebuild_all_paths(&mut store, sep)?;
        tracing::debug!(rewritten, separator = sep, "folder paths rebuilt");
    }

    let counts = store.counts();
    tracing::info!(
        media = counts.media,
        folders = counts.folders,
        faults = config.faults.enabled,
        "store ready"
    );
    Ok(StashContext {
        api: StashApi::new(store, config),
    })
}

fn load_seed() -> Result<Seed> {
    match std::env::var_os("STASH_SEED_FILE") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                StashError::Config(format!(
                    "cannot read seed file {}: {}",
                    Path::new(&path).display(),
                    e
                ))
            })?;
            Seed::from_json(&raw)
        }
        None => Seed::builtin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_context_is_seeded() {
        let ctx = with_config(StashConfig::default(), &Seed::builtin().unwrap()).unwrap();
        let counts = ctx.api.store().counts();
        assert_eq!(counts.folders, 8);
        assert_eq!(counts.users, 3);
    }

    #[test]
    fn custom_separator_rewrites_seed_paths() {
        let mut config = StashConfig::default();
        config.folders.path_separator = " > ".into();
        let ctx = with_config(config, &Seed::builtin().unwrap()).unwrap();
        let folder = ctx.api.store().folders().require("fld-000000000003").unwrap();
        assert_eq!(folder.path, "Marketing > Campaigns > Summer 2024");
    }

    #[test]
    fn malformed_seed_is_rejected() {
        let err = Seed::from_json("{\"folders\": 3}").unwrap_err();
        assert_eq!(err.status(), 500);
    }
}
