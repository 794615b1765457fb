//! Session bus plumbing
//!
//! Subscribes to the settings portal's `SettingChanged` signal and exposes the
//! handful of remote calls the Konsole adapter needs behind [`SessionBus`].

use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::message::Type as MessageType;
use zbus::zvariant::Structure;
use zbus::{Connection, MatchRule, Message, MessageStream};

use crate::constants::{dbus, konsole, portal};
use crate::signal::SignalPayload;

/// Remote calls used by the Konsole adapter
pub trait SessionBus {
    /// All names currently registered on the bus
    async fn list_names(&self) -> zbus::Result<Vec<String>>;

    /// Introspection XML of `path` on `service`
    async fn introspect(&self, service: &str, path: &str) -> zbus::Result<String>;

    /// `org.kde.konsole.Session.setProfile(profile)` on one session object
    async fn set_profile(&self, service: &str, path: &str, profile: &str) -> zbus::Result<()>;
}

impl SessionBus for Connection {
    async fn list_names(&self) -> zbus::Result<Vec<String>> {
        let reply = self
            .call_method(
                Some(dbus::DESTINATION),
                dbus::PATH,
                Some(dbus::INTERFACE),
                dbus::LIST_NAMES,
                &(),
            )
            .await?;
        reply.body().deserialize()
    }

    async fn introspect(&self, service: &str, path: &str) -> zbus::Result<String> {
        let reply = self
            .call_method(
                Some(service),
                path,
                Some(dbus::INTROSPECTABLE_INTERFACE),
                dbus::INTROSPECT,
                &(),
            )
            .await?;
        reply.body().deserialize()
    }

    async fn set_profile(&self, service: &str, path: &str, profile: &str) -> zbus::Result<()> {
        self.call_method(
            Some(service),
            path,
            Some(konsole::SESSION_INTERFACE),
            konsole::SET_PROFILE,
            &(profile,),
        )
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct IntrospectionNode {
    #[serde(rename = "node", default)]
    children: Vec<ChildNode>,
}

#[derive(Debug, Deserialize)]
struct ChildNode {
    #[serde(rename = "@name")]
    name: Option<String>,
}

/// Names of the direct child nodes in an introspection document
pub fn child_nodes(xml: &str) -> Result<Vec<String>, quick_xml::DeError> {
    let root: IntrospectionNode = quick_xml::de::from_str(xml)?;
    Ok(root
        .children
        .into_iter()
        .filter_map(|child| child.name)
        .filter(|name| !name.is_empty())
        .collect())
}

/// Register the portal match rule and forward every matching signal body
/// into a bounded channel.
///
/// The channel holds at most [`portal::CHANNEL_CAPACITY`] pending payloads, so
/// a slow dispatch batch pushes back on the forwarding task. The receiver
/// yields `None` once the subscription stream ends.
pub async fn subscribe(connection: &Connection) -> Result<mpsc::Receiver<SignalPayload>> {
    let rule = MatchRule::builder()
        .msg_type(MessageType::Signal)
        .path(portal::PATH)?
        .interface(portal::INTERFACE)?
        .member(portal::MEMBER)?
        .build();
    debug!(rule = %rule, "adding match rule");

    let mut stream = MessageStream::for_match_rule(rule, connection, Some(portal::CHANNEL_CAPACITY))
        .await
        .context("Failed to add D-Bus signal filter")?;

    let (tx, rx) = mpsc::channel(portal::CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            let payload = match message {
                Ok(message) => payload_of(&message),
                Err(err) => {
                    warn!(error = %err, "Failed to receive signal");
                    continue;
                }
            };

            if tx.send(payload).await.is_err() {
                debug!("dispatcher gone, stopping signal forwarding");
                return;
            }
        }
        info!("signal subscription stream ended");
    });

    info!(
        interface = portal::INTERFACE,
        member = portal::MEMBER,
        "Subscribed to settings portal"
    );
    Ok(rx)
}

/// Positional body fields, or an empty payload if the body is unreadable
fn payload_of(message: &Message) -> SignalPayload {
    let body = message.body();
    let fields = body
        .deserialize::<Structure<'_>>()
        .and_then(|structure| {
            structure
                .fields()
                .iter()
                .map(|field| field.try_to_owned())
                .collect::<Result<SignalPayload, _>>()
                .map_err(zbus::Error::from)
        });

    match fields {
        Ok(fields) => fields,
        Err(err) => {
            warn!(error = %err, "Failed to read signal body");
            SignalPayload::new()
        }
    }
}
