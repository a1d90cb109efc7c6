// src/storage/mod.rs

//! Durable crawl state.
//!
//! Three small tables back the scanner:
//! - the page cursor (single value)
//! - the last changelog id seen for every tracked mod
//! - links from community profiles to chat-platform accounts
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Scanner configuration
//! ├── cursor.json           # {"page_index": n}
//! ├── mods.json             # mod id -> last changelog id
//! └── author_links.json     # steam id -> discord id
//! ```
//!
//! None of the stores lock internally. The scanner is the only writer of the
//! cursor and mod tables, and a cycle never runs concurrently with another.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// Persisted page pointer.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Current page index, `0` when never set.
    async fn get(&self) -> Result<u32>;

    /// Overwrite the page index.
    async fn set(&self, page_index: u32) -> Result<()>;
}

/// Persisted last-seen changelog id per mod.
#[async_trait]
pub trait ModStateStore: Send + Sync {
    /// Whether the mod has ever been classified.
    async fn exists(&self, mod_id: &str) -> Result<bool>;

    /// Whether the stored marker equals `changelog_id`.
    async fn is_current(&self, mod_id: &str, changelog_id: &str) -> Result<bool>;

    /// Record a mod for the first time. Returns `false` when it is already tracked.
    async fn insert(&self, mod_id: &str, changelog_id: &str) -> Result<bool>;

    /// Move the marker of a tracked mod. Repeating an update is harmless.
    async fn update(&self, mod_id: &str, changelog_id: &str) -> Result<bool>;
}

/// Links from community profile ids to chat-platform user ids.
#[async_trait]
pub trait AuthorLinkStore: Send + Sync {
    async fn lookup(&self, steam_id: &str) -> Result<Option<String>>;

    /// Link a profile. Returns `false` when the profile is already linked.
    async fn insert(&self, steam_id: &str, discord_id: &str) -> Result<bool>;

    /// Remove every link pointing at `discord_id`, returning how many were removed.
    async fn delete_by_discord_id(&self, discord_id: &str) -> Result<usize>;
}
