// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Slack Web API checks for delivered alert notifications.
//!
//! Alertmanager is configured with a Slack receiver; this module reads the
//! channel back to confirm a notification arrived. Only three read-only
//! methods are used: `bots.info`, `conversations.info` and
//! `conversations.history`.

use crate::constants::SLACK_API_BASE;
use crate::errors::NotificationError;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Bot token and the IDs to look up.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackCredentials {
    /// Bot OAuth token
    pub token: String,
    /// Bot ID
    pub bot_id: String,
    /// Channel ID receiving alerts
    pub channel_id: String,
}

impl std::fmt::Debug for SlackCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackCredentials")
            .field("token", &"<redacted>")
            .field("bot_id", &self.bot_id)
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl SlackCredentials {
    /// Read `SLACK_BOT_OUATH_TOKEN`, `SLACK_BOT_ID` and `SLACK_CHANNEL_ID`
    /// through `lookup`. `None` unless all three are set and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Some(Self {
            token: get("SLACK_BOT_OUATH_TOKEN")?,
            bot_id: get("SLACK_BOT_ID")?,
            channel_id: get("SLACK_CHANNEL_ID")?,
        })
    }
}

/// `bots.info` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Bot {
    /// Bot ID
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// `conversations.info` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    /// Channel ID
    #[serde(default)]
    pub id: String,
    /// Channel name without `#`
    #[serde(default)]
    pub name: String,
}

/// One message attachment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    /// Attachment title, e.g. `[FIRING] NodeOutOfMemory (warning)`
    #[serde(default)]
    pub title: String,
    /// Link behind the title
    #[serde(default)]
    pub title_link: String,
    /// Body text
    #[serde(default)]
    pub text: String,
}

/// One channel message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    /// Message timestamp
    #[serde(default)]
    pub ts: String,
    /// Attachments, Alertmanager puts the alert in the first one
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    payload: Option<T>,
}

#[derive(Deserialize)]
struct BotPayload {
    bot: Bot,
}

#[derive(Deserialize)]
struct ChannelPayload {
    channel: Channel,
}

#[derive(Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    messages: Vec<Message>,
}

/// First attachment whose `title_link` contains `needle`.
#[must_use]
pub fn find_alert<'a>(messages: &'a [Message], needle: &str) -> Option<&'a Attachment> {
    messages
        .iter()
        .filter_map(|m| m.attachments.first())
        .find(|a| a.title_link.contains(needle))
}

/// Read-only Slack client for one bot and channel.
#[derive(Clone)]
pub struct SlackVerifier {
    http: HttpClient,
    base_url: String,
    credentials: SlackCredentials,
}

impl SlackVerifier {
    /// Client against the public Slack API.
    #[must_use]
    pub fn new(http: HttpClient, credentials: SlackCredentials) -> Self {
        Self::with_base_url(http, SLACK_API_BASE, credentials)
    }

    /// Client against another API base, e.g. a test server.
    #[must_use]
    pub fn with_base_url(
        http: HttpClient,
        base_url: impl Into<String>,
        credentials: SlackCredentials,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Credentials in use.
    #[must_use]
    pub fn credentials(&self) -> &SlackCredentials {
        &self.credentials
    }

    async fn call<T: DeserializeOwned>(
        &self,
        api_method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, NotificationError> {
        let transport = |reason: String| NotificationError::Transport {
            method: api_method.to_string(),
            reason,
        };
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), api_method);
        let url = url::Url::parse_with_params(&url, params).map_err(|e| transport(e.to_string()))?;

        debug!(method = api_method, "Calling Slack API");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.credentials.token)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("HTTP {status}")));
        }
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| transport(e.to_string()))?;

        if !envelope.ok {
            return Err(NotificationError::Api {
                method: api_method.to_string(),
                error: envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        envelope
            .payload
            .ok_or_else(|| transport("response has no payload".to_string()))
    }

    /// `bots.info` for the configured bot.
    ///
    /// # Errors
    ///
    /// Returns a [`NotificationError`].
    pub async fn bot_info(&self) -> Result<Bot, NotificationError> {
        let payload: BotPayload = self
            .call("bots.info", &[("bot", self.credentials.bot_id.as_str())])
            .await?;
        Ok(payload.bot)
    }

    /// `conversations.info` for the configured channel.
    ///
    /// # Errors
    ///
    /// Returns a [`NotificationError`].
    pub async fn channel_info(&self) -> Result<Channel, NotificationError> {
        let payload: ChannelPayload = self
            .call(
                "conversations.info",
                &[("channel", self.credentials.channel_id.as_str())],
            )
            .await?;
        Ok(payload.channel)
    }

    /// Latest messages of the configured channel.
    ///
    /// # Errors
    ///
    /// Returns a [`NotificationError`].
    pub async fn history(&self, limit: u32) -> Result<Vec<Message>, NotificationError> {
        let limit = limit.to_string();
        let payload: HistoryPayload = self
            .call(
                "conversations.history",
                &[
                    ("channel", self.credentials.channel_id.as_str()),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        Ok(payload.messages)
    }
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod notifications_tests;
