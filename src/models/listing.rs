// src/models/listing.rs

//! Listing page records.

use serde::{Deserialize, Serialize};

/// Hover metadata embedded as JSON next to every listing card.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryDetails {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One mod discovered on a listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEntry {
    /// Workshop file id
    pub id: String,

    /// Title with HTML entities decoded
    pub title: String,

    /// Short description with HTML entities decoded
    pub description: String,

    /// Author profile path, `id/<vanity>` or `profiles/<steamid64>`
    pub steam_id: String,

    /// Author name as printed on the card (may be empty)
    pub author_name: String,
}

/// A listing entry paired with its preview image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingItem {
    pub entry: ListingEntry,
    pub image: String,
}
