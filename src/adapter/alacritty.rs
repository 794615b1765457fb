//! Swaps the theme link, then touches the Alacritty config so its file
//! watcher picks the change up

use serde::Deserialize;
use std::fs::{File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::{AdapterError, SymlinkConfig};
use crate::preference::ColorSchemePreference;

pub(super) const NAME: &str = "alacritty";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlacrittyConfig {
    #[serde(flatten)]
    pub symlink: SymlinkConfig,
    pub alacritty_config_file: PathBuf,
}

impl AlacrittyConfig {
    pub fn apply(&self, preference: ColorSchemePreference) -> Result<(), AdapterError> {
        self.symlink
            .apply(preference)
            .map_err(|err| AdapterError::within(NAME, err))?;

        touch(&self.alacritty_config_file).map_err(|source| AdapterError::TouchFailed {
            path: self.alacritty_config_file.clone(),
            source,
        })?;

        debug!(config = %self.alacritty_config_file.display(), "alacritty config touched");
        Ok(())
    }
}

/// Set access and modification time to now. Does not create the file, and
/// only needs ownership of it, not write permission.
fn touch(path: &Path) -> io::Result<()> {
    let now = SystemTime::now();
    let file = File::open(path)?;
    file.set_times(FileTimes::new().set_accessed(now).set_modified(now))
}
