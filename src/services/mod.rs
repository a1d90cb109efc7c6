// src/services/mod.rs

//! Service layer for the scanner.
//!
//! This module contains the business logic for:
//! - Listing pages (`ListingFetcher`, `ListingParser`)
//! - Changelogs (`ChangelogFetcher`)
//! - Author identity (`IdentityResolver` over profiles and linked accounts)
//! - Change classification (`Classifier`)
//! - Notification delivery (`Dispatcher`)

pub mod changelog;
pub mod classifier;
pub mod directory;
pub mod identity;
pub mod listing;
pub mod notifier;
pub mod profile;

pub use changelog::ChangelogFetcher;
pub use classifier::{Classifier, ModState};
pub use directory::{DiscordDirectory, UserDirectory};
pub use identity::{
    IdentityResolver, IdentityStrategy, LinkedAccountStrategy, ProfileStrategy, Resolution,
};
pub use listing::{ListingFetcher, ListingParser, PageSchema};
pub use notifier::{Dispatcher, LogSink, NotificationSink, WebhookSink};
pub use profile::{MemoryProfileCache, ProfileCache, ProfileSource, SteamProfileFetcher};
