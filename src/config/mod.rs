//! Configuration loading
//!
//! A single JSON document found through the XDG config search path:
//!
//! ```json
//! {
//!   "no_preference_fallback": "dark",
//!   "adapters": [
//!     { "adapter": "symlink", "dark_preference_file": "~/themes/dark.conf",
//!       "light_preference_file": "~/themes/light.conf", "target_file": "~/.current-theme" }
//!   ]
//! }
//! ```
//!
//! Adapters keep file order, which is also dispatch order.

use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::adapter::Adapter;
use crate::constants::config::{APP_DIR, DEFAULT_SYSTEM_DIRS, FILENAME, LEGACY_KEY_PREFIX};
use crate::preference::NoPreferenceFallback;

/// Keys a konsole entry must carry all of, or none of
const SYMLINK_KEYS: [&str; 3] = ["dark_preference_file", "light_preference_file", "target_file"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub no_preference_fallback: NoPreferenceFallback,
    pub adapters: Vec<Adapter>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config file found in {}", display_paths(searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("reading the config file at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing the config file")]
    Parse(#[from] serde_json::Error),

    #[error(
        "adapter #{index} uses the retired per-adapter '{key}' setting; \
         remove it and set \"no_preference_fallback\" to \"dark\" or \"light\" instead"
    )]
    LegacySchema { index: usize, key: String },

    #[error("konsole adapter #{index} sets some symlink fields but is missing '{missing}'")]
    IncompleteSymlink { index: usize, missing: &'static str },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Config {
    /// Per-user config location, where `--help` tells users to put the file
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// First existing config file on the XDG search path
    pub fn locate() -> Result<PathBuf, ConfigError> {
        let searched = search_paths(dirs::config_dir(), std::env::var_os("XDG_CONFIG_DIRS"));
        searched
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or(ConfigError::NotFound { searched })
    }

    /// Read and parse the config file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&contents)?;
        info!(
            path = %path.display(),
            adapters = config.adapters.len(),
            fallback = %config.no_preference_fallback,
            "Loaded config"
        );
        Ok(config)
    }

    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let raw: Value = serde_json::from_str(json)?;
        check_schema(&raw)?;

        let mut config: Config = serde_json::from_value(raw)?;
        for adapter in &mut config.adapters {
            adapter.expand_home();
        }
        debug!(config = ?config, "config decoded");
        Ok(config)
    }
}

/// `$XDG_CONFIG_HOME` first, then each entry of `$XDG_CONFIG_DIRS`
fn search_paths(config_home: Option<PathBuf>, config_dirs: Option<OsString>) -> Vec<PathBuf> {
    let system_dirs = config_dirs
        .filter(|dirs| !dirs.is_empty())
        .unwrap_or_else(|| OsString::from(DEFAULT_SYSTEM_DIRS));

    config_home
        .into_iter()
        .chain(std::env::split_paths(&system_dirs).filter(|dir| dir.is_absolute()))
        .map(|dir| dir.join(APP_DIR).join(FILENAME))
        .collect()
}

/// Reject shapes serde would otherwise drop silently
fn check_schema(raw: &Value) -> Result<(), ConfigError> {
    let Some(adapters) = raw.get("adapters").and_then(Value::as_array) else {
        return Ok(());
    };

    for (index, adapter) in adapters.iter().enumerate() {
        let Some(fields) = adapter.as_object() else {
            continue;
        };

        if let Some(key) = fields.keys().find(|key| key.starts_with(LEGACY_KEY_PREFIX)) {
            return Err(ConfigError::LegacySchema {
                index,
                key: key.clone(),
            });
        }

        if fields.get("adapter").and_then(Value::as_str) == Some("konsole") {
            let present = SYMLINK_KEYS.iter().filter(|key| fields.contains_key(**key)).count();
            if present > 0
                && let Some(missing) = SYMLINK_KEYS.into_iter().find(|key| !fields.contains_key(*key))
            {
                return Err(ConfigError::IncompleteSymlink {
                    index,
                    missing,
                });
            }
        }
    }
    Ok(())
}
