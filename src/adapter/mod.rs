//! Adapters apply a resolved appearance to one application each
//!
//! The variant set is closed: configuration decoding picks one of these by
//! the `adapter` discriminant, so an unknown adapter never reaches dispatch.

mod alacritty;
mod gtk;
mod konsole;
mod symlink;
mod tmux;

pub use alacritty::AlacrittyConfig;
pub use gtk::GtkThemeConfig;
pub use konsole::{KonsoleConfig, KonsoleFailure};
pub use symlink::SymlinkConfig;
pub use tmux::TmuxConfig;

use serde::Deserialize;
use std::ffi::OsStr;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

use crate::bus::SessionBus;
use crate::preference::ColorSchemePreference;

/// One configured adapter, tagged by `"adapter"` in the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "adapter", rename_all = "snake_case")]
pub enum Adapter {
    Symlink(SymlinkConfig),
    Tmux(TmuxConfig),
    Alacritty(AlacrittyConfig),
    Konsole(KonsoleConfig),
    GtkTheme(GtkThemeConfig),
}

impl Adapter {
    /// Discriminant as written in the config file
    pub fn kind(&self) -> &'static str {
        match self {
            Adapter::Symlink(_) => symlink::NAME,
            Adapter::Tmux(_) => tmux::NAME,
            Adapter::Alacritty(_) => alacritty::NAME,
            Adapter::Konsole(_) => konsole::NAME,
            Adapter::GtkTheme(_) => gtk::NAME,
        }
    }

    /// Apply an already-resolved preference.
    ///
    /// `bus` is only used by Konsole; it is borrowed and never closed here.
    pub async fn apply<B: SessionBus>(
        &self,
        preference: ColorSchemePreference,
        bus: &B,
    ) -> Result<(), AdapterError> {
        match self {
            Adapter::Symlink(config) => config.apply(preference),
            Adapter::Tmux(config) => config.apply(preference).await,
            Adapter::Alacritty(config) => config.apply(preference),
            Adapter::Konsole(config) => config.apply(preference, bus).await,
            Adapter::GtkTheme(config) => config.apply(preference).await,
        }
    }

    /// Expand a leading `~` in every configured path
    pub fn expand_home(&mut self) {
        match self {
            Adapter::Symlink(config) => config.expand_home(),
            Adapter::Tmux(config) => {
                config.symlink.expand_home();
                expand_home(&mut config.tmux_config_file);
            }
            Adapter::Alacritty(config) => {
                config.symlink.expand_home();
                expand_home(&mut config.alacritty_config_file);
            }
            Adapter::Konsole(config) => {
                if let Some(symlink) = config.symlink.as_mut() {
                    symlink.expand_home();
                }
            }
            Adapter::GtkTheme(_) => {}
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{adapter} adapter has no behavior for {preference}")]
    UnsupportedPreference {
        adapter: &'static str,
        preference: ColorSchemePreference,
    },

    #[error("symlinking {} to the target file {}", link.display(), target.display())]
    LinkCreationFailed {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Symlink step of a composing adapter
    #[error("symlinking within {adapter} adapter")]
    Symlink {
        adapter: &'static str,
        #[source]
        source: Box<AdapterError>,
    },

    #[error("sourcing tmux config {}", path.display())]
    ReloadFailed {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("touching alacritty config {}", path.display())]
    TouchFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "setting konsole profile '{profile}' failed for {} target(s): {}",
        failures.len(),
        konsole::summarize(failures)
    )]
    KonsoleDispatchFailed {
        profile: String,
        failures: Vec<KonsoleFailure>,
    },

    #[error("setting gtk theme '{theme}'")]
    ThemeSetFailed {
        theme: String,
        #[source]
        source: CommandError,
    },
}

impl AdapterError {
    fn unsupported(adapter: &'static str, preference: ColorSchemePreference) -> Self {
        AdapterError::UnsupportedPreference {
            adapter,
            preference,
        }
    }

    /// Attach the composing adapter's name to a failed symlink step
    fn within(adapter: &'static str, source: AdapterError) -> Self {
        AdapterError::Symlink {
            adapter,
            source: Box::new(source),
        }
    }
}

/// Failure of an external command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("launching {program}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Status {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Run `program` to completion, treating a non-zero exit as failure
pub async fn run_command<I, S>(program: &str, args: I) -> Result<(), CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| CommandError::Launch {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CommandError::Status {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!(program, "command finished");
    Ok(())
}

/// Replace a leading `~` with the user's home directory
pub fn expand_home(path: &mut PathBuf) {
    let Ok(rest) = path.strip_prefix("~") else {
        return;
    };
    if let Some(home) = dirs::home_dir() {
        *path = home.join(rest);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bus::tests::FakeBus;

    #[test]
    fn test_adapters_decode_by_discriminant() {
        let json = r#"[
            {"adapter": "symlink", "dark_preference_file": "/d", "light_preference_file": "/l", "target_file": "/t"},
            {"adapter": "tmux", "dark_preference_file": "/d", "light_preference_file": "/l", "target_file": "/t",
             "tmux_config_file": "/tmux.conf"},
            {"adapter": "alacritty", "dark_preference_file": "/d", "light_preference_file": "/l", "target_file": "/t",
             "alacritty_config_file": "/alacritty.toml"},
            {"adapter": "konsole", "dark_profile_name": "Dark", "light_profile_name": "Light"},
            {"adapter": "gtk_theme", "dark_theme_name": "Adwaita-dark", "light_theme_name": "Adwaita"}
        ]"#;

        let adapters: Vec<Adapter> = serde_json::from_str(json).unwrap();
        let kinds: Vec<_> = adapters.iter().map(Adapter::kind).collect();
        assert_eq!(kinds, ["symlink", "tmux", "alacritty", "konsole", "gtk_theme"]);

        let Adapter::Tmux(tmux) = &adapters[1] else {
            panic!("expected tmux adapter");
        };
        assert_eq!(tmux.symlink.target_file, PathBuf::from("/t"));
        assert_eq!(tmux.tmux_config_file, PathBuf::from("/tmux.conf"));

        let Adapter::Konsole(konsole) = &adapters[3] else {
            panic!("expected konsole adapter");
        };
        assert!(konsole.symlink.is_none());
    }

    #[test]
    fn test_unknown_discriminant_rejected() {
        let json = r#"{"adapter": "kitty", "target_file": "/t"}"#;
        assert!(serde_json::from_str::<Adapter>(json).is_err());
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let json = r#"{"adapter": "tmux", "dark_preference_file": "/d", "light_preference_file": "/l", "target_file": "/t"}"#;
        assert!(serde_json::from_str::<Adapter>(json).is_err());
    }

    #[tokio::test]
    async fn test_every_variant_rejects_no_preference() {
        let adapters = [
            Adapter::Symlink(SymlinkConfig::new("/d", "/l", "/nonexistent/target")),
            Adapter::Tmux(TmuxConfig {
                symlink: SymlinkConfig::new("/d", "/l", "/nonexistent/target"),
                tmux_config_file: PathBuf::from("/nonexistent/tmux.conf"),
            }),
            Adapter::Alacritty(AlacrittyConfig {
                symlink: SymlinkConfig::new("/d", "/l", "/nonexistent/target"),
                alacritty_config_file: PathBuf::from("/nonexistent/alacritty.toml"),
            }),
            Adapter::Konsole(KonsoleConfig {
                symlink: None,
                dark_profile_name: "Dark".to_string(),
                light_profile_name: "Light".to_string(),
            }),
            Adapter::GtkTheme(GtkThemeConfig {
                dark_theme_name: "Adwaita-dark".to_string(),
                light_theme_name: "Adwaita".to_string(),
            }),
        ];

        let bus = FakeBus::default();
        for adapter in &adapters {
            let err = adapter
                .apply(ColorSchemePreference::NoPreference, &bus)
                .await
                .unwrap_err();
            let unsupported = match &err {
                AdapterError::Symlink { source, .. } => source.as_ref(),
                other => other,
            };
            assert!(
                matches!(unsupported, AdapterError::UnsupportedPreference { .. }),
                "{} returned {err:?}",
                adapter.kind()
            );
        }
        assert!(bus.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_command_reports_exit_status() {
        let err = run_command("sh", ["-c", "echo broken >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            CommandError::Status { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        run_command("sh", ["-c", "exit 0"]).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_command_reports_launch_failure() {
        let err = run_command("themer-test-no-such-program", ["x"]).await.unwrap_err();
        assert!(matches!(err, CommandError::Launch { .. }));
    }

    #[test]
    fn test_expand_home_only_touches_tilde_prefix() {
        let mut absolute = PathBuf::from("/etc/theme");
        expand_home(&mut absolute);
        assert_eq!(absolute, PathBuf::from("/etc/theme"));

        let mut relative = PathBuf::from("themes/dark");
        expand_home(&mut relative);
        assert_eq!(relative, PathBuf::from("themes/dark"));

        if let Some(home) = dirs::home_dir() {
            let mut tilde = PathBuf::from("~/.config/theme");
            expand_home(&mut tilde);
            assert_eq!(tilde, home.join(".config/theme"));
        }
    }
}
