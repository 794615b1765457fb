//! Application-wide constants
//!
//! Bus names, command lines and file locations used throughout the daemon.

/// Settings portal signal we subscribe to
pub mod portal {
    /// Object path the portal backend emits `SettingChanged` from
    pub const PATH: &str = "/org/freedesktop/portal/desktop";

    /// Backend settings interface
    pub const INTERFACE: &str = "org.freedesktop.impl.portal.Settings";

    /// Signal member carrying (namespace, key, value)
    pub const MEMBER: &str = "SettingChanged";

    /// The only key the dispatcher reacts to
    pub const COLOR_SCHEME_KEY: &str = "color-scheme";

    /// Pending notifications buffered between the bus and the dispatcher
    pub const CHANNEL_CAPACITY: usize = 10;
}

/// Konsole session bus constants
pub mod konsole {
    /// Every running Konsole window registers `org.kde.konsole-<pid>`
    pub const SERVICE_PREFIX: &str = "org.kde.konsole-";

    /// Parent object of all session objects
    pub const SESSIONS_PATH: &str = "/Sessions";

    pub const SESSION_INTERFACE: &str = "org.kde.konsole.Session";

    pub const SET_PROFILE: &str = "setProfile";
}

/// Message bus daemon and introspection
pub mod dbus {
    pub const DESTINATION: &str = "org.freedesktop.DBus";
    pub const PATH: &str = "/org/freedesktop/DBus";
    pub const INTERFACE: &str = "org.freedesktop.DBus";
    pub const LIST_NAMES: &str = "ListNames";

    pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";
    pub const INTROSPECT: &str = "Introspect";
}

/// External programs invoked by adapters
pub mod commands {
    pub const TMUX: &str = "tmux";
    pub const TMUX_SOURCE_FILE: &str = "source-file";

    pub const GSETTINGS: &str = "gsettings";
    pub const GNOME_INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
    pub const GTK_THEME_KEY: &str = "gtk-theme";
}

/// Configuration file location
pub mod config {
    /// Directory under the XDG config home
    pub const APP_DIR: &str = "themer";

    /// Config filename
    pub const FILENAME: &str = "config.json";

    /// Searched when `XDG_CONFIG_DIRS` is unset or empty
    pub const DEFAULT_SYSTEM_DIRS: &str = "/etc/xdg";

    /// Key prefix used by the retired per-adapter no-preference schema
    pub const LEGACY_KEY_PREFIX: &str = "no_preference_";
}

/// Symlink swap
pub mod symlink {
    /// Suffix of the sibling link renamed over the target
    pub const TEMP_SUFFIX: &str = ".themer-tmp";
}
