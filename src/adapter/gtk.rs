//! Sets the GTK theme through gsettings

use serde::Deserialize;
use tracing::debug;

use super::{run_command, AdapterError};
use crate::constants::commands::{GNOME_INTERFACE_SCHEMA, GSETTINGS, GTK_THEME_KEY};
use crate::preference::{self, ColorSchemePreference};

pub(super) const NAME: &str = "gtk_theme";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GtkThemeConfig {
    pub dark_theme_name: String,
    pub light_theme_name: String,
}

impl GtkThemeConfig {
    pub async fn apply(&self, preference: ColorSchemePreference) -> Result<(), AdapterError> {
        let theme = preference::select(
            preference,
            self.dark_theme_name.as_str(),
            self.light_theme_name.as_str(),
        )
        .ok_or_else(|| AdapterError::unsupported(NAME, preference))?;

        run_command(GSETTINGS, ["set", GNOME_INTERFACE_SCHEMA, GTK_THEME_KEY, theme])
            .await
            .map_err(|source| AdapterError::ThemeSetFailed {
                theme: theme.to_string(),
                source,
            })?;

        debug!(theme, "gtk theme set");
        Ok(())
    }
}
