// src/models/mod.rs

//! Domain models for the scanner.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod changelog;
mod config;
mod identity;
mod listing;
mod notification;

// Re-export all public types
pub use changelog::{ChangelogRecord, parse_headline_date};
pub use config::{
    Config, CrawlerConfig, IdentityConfig, LoggingConfig, NotifierConfig, ScheduleConfig,
    WorkshopConfig,
};
pub use identity::{AuthorProfile, Identity, PlatformUser};
pub use listing::{EntryDetails, ListingEntry, ListingItem};
pub use notification::{
    AllowedMentions, Announcement, Embed, EmbedAuthor, EmbedMedia, Notification,
    NotificationKind, Severity, WebhookMessage,
};
