//! Swaps the theme link, then asks the tmux server to re-source its config

use serde::Deserialize;
use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::debug;

use super::{run_command, AdapterError, SymlinkConfig};
use crate::constants::commands::{TMUX, TMUX_SOURCE_FILE};
use crate::preference::ColorSchemePreference;

pub(super) const NAME: &str = "tmux";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TmuxConfig {
    #[serde(flatten)]
    pub symlink: SymlinkConfig,
    pub tmux_config_file: PathBuf,
}

impl TmuxConfig {
    /// The link stays updated even when the reload fails.
    pub async fn apply(&self, preference: ColorSchemePreference) -> Result<(), AdapterError> {
        self.symlink
            .apply(preference)
            .map_err(|err| AdapterError::within(NAME, err))?;

        run_command(TMUX, [OsStr::new(TMUX_SOURCE_FILE), self.tmux_config_file.as_os_str()])
            .await
            .map_err(|source| AdapterError::ReloadFailed {
                path: self.tmux_config_file.clone(),
                source,
            })?;

        debug!(config = %self.tmux_config_file.display(), "tmux config reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_reload_failure_keeps_new_link() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dark.conf"), "").unwrap();
        fs::write(dir.path().join("light.conf"), "").unwrap();
        let config = TmuxConfig {
            symlink: SymlinkConfig::new(
                dir.path().join("dark.conf"),
                dir.path().join("light.conf"),
                dir.path().join("theme.conf"),
            ),
            // Never exists, so source-file fails whether or not tmux is installed
            tmux_config_file: dir.path().join("absent").join("tmux.conf"),
        };

        let err = config.apply(ColorSchemePreference::PreferLight).await.unwrap_err();

        assert!(matches!(err, AdapterError::ReloadFailed { .. }));
        assert_eq!(
            fs::read_link(&config.symlink.target_file).unwrap(),
            config.symlink.light_preference_file
        );
    }

    #[tokio::test]
    async fn test_symlink_failure_skips_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = TmuxConfig {
            symlink: SymlinkConfig::new("/d", "/l", dir.path().join("missing").join("theme.conf")),
            tmux_config_file: dir.path().join("tmux.conf"),
        };

        let err = config.apply(ColorSchemePreference::PreferDark).await.unwrap_err();

        match err {
            AdapterError::Symlink { adapter, source } => {
                assert_eq!(adapter, NAME);
                assert!(matches!(*source, AdapterError::LinkCreationFailed { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
