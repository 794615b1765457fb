//! Switches the profile of every open Konsole session over the session bus

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

use super::{AdapterError, SymlinkConfig};
use crate::bus::{child_nodes, SessionBus};
use crate::constants::konsole::{SERVICE_PREFIX, SESSIONS_PATH};
use crate::preference::{self, ColorSchemePreference};

pub(super) const NAME: &str = "konsole";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KonsoleConfig {
    /// Optional theme link swapped before the profiles are switched
    #[serde(flatten)]
    pub symlink: Option<SymlinkConfig>,
    pub dark_profile_name: String,
    pub light_profile_name: String,
}

/// A service or session that could not be updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KonsoleFailure {
    /// Bus name, optionally followed by the session object path
    pub target: String,
    pub reason: String,
}

impl fmt::Display for KonsoleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.reason)
    }
}

pub(super) fn summarize(failures: &[KonsoleFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl KonsoleConfig {
    /// Every Konsole service and session is attempted; failures are
    /// collected and reported together.
    pub async fn apply<B: SessionBus>(
        &self,
        preference: ColorSchemePreference,
        bus: &B,
    ) -> Result<(), AdapterError> {
        let profile = preference::select(
            preference,
            self.dark_profile_name.as_str(),
            self.light_profile_name.as_str(),
        )
        .ok_or_else(|| AdapterError::unsupported(NAME, preference))?;

        if let Some(symlink) = &self.symlink {
            symlink
                .apply(preference)
                .map_err(|err| AdapterError::within(NAME, err))?;
        }

        let dispatch_failed = |failures| AdapterError::KonsoleDispatchFailed {
            profile: profile.to_string(),
            failures,
        };

        let names = bus.list_names().await.map_err(|err| {
            dispatch_failed(vec![KonsoleFailure {
                target: crate::constants::dbus::DESTINATION.to_string(),
                reason: format!("listing service names: {err}"),
            }])
        })?;

        let mut failures = Vec::new();
        let mut updated = 0usize;

        for service in names.iter().filter(|name| name.starts_with(SERVICE_PREFIX)) {
            let sessions = match sessions_of(bus, service).await {
                Ok(sessions) => sessions,
                Err(reason) => {
                    warn!(service = %service, reason = %reason, "Failed to enumerate konsole sessions");
                    failures.push(KonsoleFailure {
                        target: service.clone(),
                        reason,
                    });
                    continue;
                }
            };

            for session in sessions {
                match bus.set_profile(service, &session, profile).await {
                    Ok(()) => updated += 1,
                    Err(err) => failures.push(KonsoleFailure {
                        target: format!("{service}{session}"),
                        reason: format!("setting profile: {err}"),
                    }),
                }
            }
        }

        debug!(profile, updated, failed = failures.len(), "konsole profiles dispatched");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(dispatch_failed(failures))
        }
    }
}

/// Session object paths below `/Sessions`, deduplicated
async fn sessions_of<B: SessionBus>(bus: &B, service: &str) -> Result<BTreeSet<String>, String> {
    let xml = bus
        .introspect(service, SESSIONS_PATH)
        .await
        .map_err(|err| format!("introspecting {SESSIONS_PATH}: {err}"))?;

    let children = child_nodes(&xml).map_err(|err| format!("parsing introspection: {err}"))?;

    Ok(children
        .into_iter()
        .map(|child| format!("{SESSIONS_PATH}/{child}"))
        .collect())
}
