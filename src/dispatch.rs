//! The dispatch loop
//!
//! Takes signal payloads off the subscription channel one at a time, turns
//! `color-scheme` changes into a resolved preference and runs every adapter
//! in config order. Nothing that happens to a single signal or adapter stops
//! the loop.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use zbus::zvariant::OwnedValue;

use crate::adapter::Adapter;
use crate::bus::SessionBus;
use crate::config::Config;
use crate::constants::portal::COLOR_SCHEME_KEY;
use crate::preference::{ColorSchemePreference, NoPreferenceFallback};
use crate::signal::{decode_setting_changed, SignalPayload};

/// What became of one delivered signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Empty delivery
    Empty,
    /// Payload did not have the `(s, s, v)` shape
    Malformed,
    /// Some other setting changed
    IgnoredKey,
    /// `color-scheme` arrived with a value that is not a `u32`
    IgnoredValueType,
    /// `u32` outside 0..=2
    InvalidPreference,
    /// Adapters ran; `failed` of them returned an error
    Dispatched {
        preference: ColorSchemePreference,
        failed: usize,
    },
}

/// Owns the adapter list, the fallback and a handle to the session bus for
/// the lifetime of the run
pub struct Dispatcher<B> {
    adapters: Vec<Adapter>,
    fallback: NoPreferenceFallback,
    bus: B,
}

impl<B: SessionBus> Dispatcher<B> {
    pub fn new(config: Config, bus: B) -> Self {
        Self {
            adapters: config.adapters,
            fallback: config.no_preference_fallback,
            bus,
        }
    }

    /// Process payloads until the subscription closes the channel
    pub async fn run(&self, mut signals: mpsc::Receiver<SignalPayload>) -> Result<()> {
        info!(adapters = self.adapters.len(), fallback = %self.fallback, "Waiting for color-scheme changes");

        while let Some(payload) = signals.recv().await {
            let outcome = self.handle(&payload).await;
            debug!(outcome = ?outcome, "signal processed");
        }

        Err(anyhow!("signal subscription closed"))
    }

    /// Process one delivered payload
    pub async fn handle(&self, payload: &[OwnedValue]) -> Outcome {
        if payload.is_empty() {
            return Outcome::Empty;
        }

        let setting = match decode_setting_changed(payload) {
            Ok(setting) => setting,
            Err(err) => {
                warn!(field = %err.field(), error = %err, "Parsing the SettingChanged signal");
                return Outcome::Malformed;
            }
        };

        if setting.key != COLOR_SCHEME_KEY {
            debug!(namespace = setting.namespace, key = setting.key, "ignoring setting");
            return Outcome::IgnoredKey;
        }

        let Some(raw) = setting.value_u32() else {
            debug!(value = ?setting.value, "ignoring color-scheme value of unexpected type");
            return Outcome::IgnoredValueType;
        };

        let preference = match ColorSchemePreference::decode(i64::from(raw)) {
            Ok(preference) => preference,
            Err(err) => {
                warn!(error = %err, "Parsing the color-scheme preference");
                return Outcome::InvalidPreference;
            }
        };

        let resolved = preference.resolve(self.fallback);
        if resolved != preference {
            debug!(fallback = %self.fallback, "no preference reported, using fallback");
        }

        let failed = self.dispatch(resolved).await;
        Outcome::Dispatched {
            preference: resolved,
            failed,
        }
    }

    /// Run every adapter in order and return how many failed
    pub async fn dispatch(&self, preference: ColorSchemePreference) -> usize {
        info!(preference = %preference, "Applying color scheme");

        let mut failed = 0;
        for (index, adapter) in self.adapters.iter().enumerate() {
            match adapter.apply(preference, &self.bus).await {
                Ok(()) => info!(adapter = adapter.kind(), index, "adapter applied"),
                Err(err) => {
                    failed += 1;
                    error!(
                        adapter = adapter.kind(),
                        index,
                        "Executing the adapter failed: {:#}",
                        anyhow::Error::new(err)
                    );
                }
            }
        }
        failed
    }
}
