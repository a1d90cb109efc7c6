// src/services/notifier.rs

//! Notification rendering and delivery.
//!
//! A [`Dispatcher`] renders announcements into webhook messages and routes
//! them to one of two sinks by severity. Delivery is best effort: the mod
//! state was already persisted, so a failed send is logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{
    AllowedMentions, Announcement, ChangelogRecord, Embed, EmbedAuthor, EmbedMedia, Identity,
    ListingItem, Notification, NotificationKind, Severity, WebhookMessage,
};
use crate::utils::text::{strip_markup, truncate};

const UNKNOWN_AUTHOR: &str = "an unknown author";

/// Destination for rendered messages.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &WebhookMessage) -> Result<()>;
}

/// Posts messages to a chat webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, message: &WebhookMessage) -> Result<()> {
        let response = self.client.post(&self.url).json(message).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(&self.url, status));
        }
        Ok(())
    }
}

/// Logs messages instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogSink {
    label: &'static str,
}

impl LogSink {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, message: &WebhookMessage) -> Result<()> {
        log::info!(
            "[dry-run:{}] {}\n{}",
            self.label,
            message.content,
            serde_json::to_string_pretty(&message.embeds)?
        );
        Ok(())
    }
}

pub struct Dispatcher {
    root: String,
    description_limit: usize,
    major: Arc<dyn NotificationSink>,
    minor: Arc<dyn NotificationSink>,
}

impl Dispatcher {
    pub fn new(
        root: impl Into<String>,
        description_limit: usize,
        major: Arc<dyn NotificationSink>,
        minor: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            root: root.into(),
            description_limit,
            major,
            minor,
        }
    }

    /// Render the message for an announcement.
    pub fn build(
        &self,
        announcement: Announcement,
        item: &ListingItem,
        identity: &Identity,
        changelog: &ChangelogRecord,
    ) -> Notification {
        let entry = &item.entry;
        let mention = identity.mention.as_deref().unwrap_or(UNKNOWN_AUTHOR);

        let (content, url, body, image, thumbnail) = match announcement.kind {
            NotificationKind::New => (
                format!(
                    ":new: A new mod has been uploaded to the Steam Workshop! It's called **{}**, by {}:",
                    entry.title, mention
                ),
                format!("{}/sharedfiles/filedetails/?id={}", self.root, entry.id),
                strip_markup(&entry.description).replacen("\n\n", "\n", 1),
                Some(EmbedMedia {
                    url: item.image.clone(),
                }),
                None,
            ),
            NotificationKind::Updated => (
                format!(
                    ":loudspeaker: {} has posted an update to **{}** on the Steam Workshop!",
                    mention, entry.title
                ),
                format!(
                    "{}/sharedfiles/filedetails/changelog/{}#{}",
                    self.root, entry.id, changelog.id
                ),
                strip_markup(&changelog.description),
                None,
                Some(EmbedMedia {
                    url: item.image.clone(),
                }),
            ),
        };

        let embed = Embed {
            title: entry.title.clone(),
            url,
            description: truncate(&body, self.description_limit).into_owned(),
            author: EmbedAuthor {
                name: identity.display_name.clone(),
                icon_url: identity.avatar_url.clone(),
                url: format!("{}/{}", self.root, entry.steam_id),
            },
            image,
            thumbnail,
            timestamp: changelog.date,
            color: announcement.kind.color(),
        };

        Notification {
            severity: announcement.severity,
            message: WebhookMessage {
                content,
                embeds: vec![embed],
                allowed_mentions: AllowedMentions::users_only(),
            },
        }
    }

    /// Deliver a notification to the sink matching its severity.
    ///
    /// Returns whether delivery succeeded.
    pub async fn send(&self, notification: &Notification) -> bool {
        let sink = match notification.severity {
            Severity::Major => &self.major,
            Severity::Minor => &self.minor,
        };

        match sink.send(&notification.message).await {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "Failed to send {} notification: {}",
                    notification.severity.as_str(),
                    e
                );
                false
            }
        }
    }
}
