//! Appearance preference model
//!
//! The portal reports `color-scheme` as a bare integer. This module turns it
//! into a typed value and resolves "no preference" against the configured
//! fallback side.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Appearance reported by the desktop session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSchemePreference {
    NoPreference,
    PreferDark,
    PreferLight,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("{0} is not a valid color-scheme value (expected 0, 1 or 2)")]
    InvalidPreferenceValue(i64),
}

impl ColorSchemePreference {
    /// Decode the raw portal value. Anything outside 0..=2 is rejected.
    pub fn decode(raw: i64) -> Result<Self, PreferenceError> {
        match raw {
            0 => Ok(Self::NoPreference),
            1 => Ok(Self::PreferDark),
            2 => Ok(Self::PreferLight),
            other => Err(PreferenceError::InvalidPreferenceValue(other)),
        }
    }

    /// Substitute the configured side for `NoPreference`
    pub fn resolve(self, fallback: NoPreferenceFallback) -> Self {
        match (self, fallback) {
            (Self::NoPreference, NoPreferenceFallback::Dark) => Self::PreferDark,
            (Self::NoPreference, NoPreferenceFallback::Light) => Self::PreferLight,
            (concrete, _) => concrete,
        }
    }
}

impl fmt::Display for ColorSchemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoPreference => "no-preference",
            Self::PreferDark => "prefer-dark",
            Self::PreferLight => "prefer-light",
        })
    }
}

/// Side used when the session reports no preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoPreferenceFallback {
    Dark,
    Light,
}

impl fmt::Display for NoPreferenceFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

/// Pick the dark or light variant of an adapter setting.
///
/// Adapters only carry two sides, so an unresolved `NoPreference` yields `None`
/// and the caller reports it as unsupported.
pub fn select<'a, T: ?Sized>(
    preference: ColorSchemePreference,
    dark: &'a T,
    light: &'a T,
) -> Option<&'a T> {
    match preference {
        ColorSchemePreference::PreferDark => Some(dark),
        ColorSchemePreference::PreferLight => Some(light),
        ColorSchemePreference::NoPreference => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_domain() {
        assert_eq!(ColorSchemePreference::decode(0), Ok(ColorSchemePreference::NoPreference));
        assert_eq!(ColorSchemePreference::decode(1), Ok(ColorSchemePreference::PreferDark));
        assert_eq!(ColorSchemePreference::decode(2), Ok(ColorSchemePreference::PreferLight));
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        for raw in [-1, 3, 42, i64::from(u32::MAX)] {
            assert_eq!(
                ColorSchemePreference::decode(raw),
                Err(PreferenceError::InvalidPreferenceValue(raw))
            );
        }
    }

    #[test]
    fn test_resolve_no_preference_uses_fallback() {
        assert_eq!(
            ColorSchemePreference::NoPreference.resolve(NoPreferenceFallback::Dark),
            ColorSchemePreference::PreferDark
        );
        assert_eq!(
            ColorSchemePreference::NoPreference.resolve(NoPreferenceFallback::Light),
            ColorSchemePreference::PreferLight
        );
    }

    #[test]
    fn test_resolve_never_overrides_concrete_preference() {
        for fallback in [NoPreferenceFallback::Dark, NoPreferenceFallback::Light] {
            assert_eq!(
                ColorSchemePreference::PreferDark.resolve(fallback),
                ColorSchemePreference::PreferDark
            );
            assert_eq!(
                ColorSchemePreference::PreferLight.resolve(fallback),
                ColorSchemePreference::PreferLight
            );
        }
    }

    #[test]
    fn test_select_rejects_no_preference() {
        assert_eq!(select(ColorSchemePreference::PreferDark, "d", "l"), Some("d"));
        assert_eq!(select(ColorSchemePreference::PreferLight, "d", "l"), Some("l"));
        assert_eq!(select(ColorSchemePreference::NoPreference, "d", "l"), None);
    }

    #[test]
    fn test_fallback_deserializes_lowercase() {
        let fallback: NoPreferenceFallback = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(fallback, NoPreferenceFallback::Light);
        assert!(serde_json::from_str::<NoPreferenceFallback>("\"none\"").is_err());
    }
}
