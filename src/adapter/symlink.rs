//! Points a target path at the dark or light variant of a file

use serde::Deserialize;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::AdapterError;
use crate::constants::symlink::TEMP_SUFFIX;
use crate::preference::{self, ColorSchemePreference};

pub(super) const NAME: &str = "symlink";

/// Symlink settings, also embedded by the tmux, alacritty and konsole adapters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymlinkConfig {
    pub dark_preference_file: PathBuf,
    pub light_preference_file: PathBuf,
    pub target_file: PathBuf,
}

impl SymlinkConfig {
    #[cfg(test)]
    pub fn new(
        dark_preference_file: impl Into<PathBuf>,
        light_preference_file: impl Into<PathBuf>,
        target_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dark_preference_file: dark_preference_file.into(),
            light_preference_file: light_preference_file.into(),
            target_file: target_file.into(),
        }
    }

    /// Re-point `target_file` at the file matching `preference`.
    ///
    /// A missing target is fine. The new link is staged next to the target and
    /// renamed over it, so readers never see the target absent.
    pub fn apply(&self, preference: ColorSchemePreference) -> Result<(), AdapterError> {
        let link = preference::select(
            preference,
            self.dark_preference_file.as_path(),
            self.light_preference_file.as_path(),
        )
        .ok_or_else(|| AdapterError::unsupported(NAME, preference))?;

        swap_link(link, &self.target_file).map_err(|source| AdapterError::LinkCreationFailed {
            link: link.to_path_buf(),
            target: self.target_file.clone(),
            source,
        })?;

        debug!(target = %self.target_file.display(), link = %link.display(), "symlink updated");
        Ok(())
    }

    pub(super) fn expand_home(&mut self) {
        super::expand_home(&mut self.dark_preference_file);
        super::expand_home(&mut self.light_preference_file);
        super::expand_home(&mut self.target_file);
    }
}

fn swap_link(link: &Path, target: &Path) -> io::Result<()> {
    let staging = staging_path(target)?;

    remove_if_present(&staging)?;
    symlink(link, &staging)?;

    let renamed = match fs::rename(&staging, target) {
        // A link cannot replace a directory; an empty one is removed first
        Err(err) if err.kind() == io::ErrorKind::IsADirectory => {
            fs::remove_dir(target).and_then(|()| fs::rename(&staging, target))
        }
        other => other,
    };

    if let Err(err) = renamed {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    Ok(())
}

/// `.<name>.themer-tmp` next to the target
fn staging_path(target: &Path) -> io::Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("target {} has no file name", target.display()),
        )
    })?;

    let mut staged = std::ffi::OsString::from(".");
    staged.push(name);
    staged.push(TEMP_SUFFIX);
    Ok(target.with_file_name(staged))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
