// src/services/changelog.rs

//! Changelog fetcher.
//!
//! Only the newest changelog block on a mod's changelog page matters: its id
//! is the change marker and its text drives suppression and severity.

use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;
use reqwest::Client;
use reqwest::header::COOKIE;

use crate::error::{AppError, Result};
use crate::models::{ChangelogRecord, parse_headline_date};
use crate::utils::http::fetch_text;
use crate::utils::text::decode_entities;

/// Pins headline times to UTC.
const TIMEZONE_COOKIE: &str = "timezoneOffset=0,0";

static LATEST_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="changelog headline">(.+?)</div>.+?<p id="([0-9]+)">(?-s)(.*)</p>"#)
        .expect("changelog block pattern")
});

/// Parse the first changelog block of a changelog page.
pub fn parse_changelog(page: &str, current_year: i32) -> Result<ChangelogRecord> {
    let caps = LATEST_BLOCK
        .captures(page)
        .ok_or_else(|| AppError::structure("No changelog entries found"))?;

    Ok(ChangelogRecord {
        date: parse_headline_date(&caps[1], current_year)?,
        id: caps[2].to_string(),
        description: decode_entities(&caps[3]),
    })
}

/// Fetches the latest changelog entry of a mod.
#[derive(Debug, Clone)]
pub struct ChangelogFetcher {
    client: Client,
    root: String,
}

impl ChangelogFetcher {
    pub fn new(client: Client, root: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    pub fn changelog_url(&self, mod_id: &str) -> String {
        format!("{}/sharedfiles/filedetails/changelog/{}", self.root, mod_id)
    }

    /// Latest changelog of `mod_id`, or `None` when it cannot be retrieved.
    ///
    /// Failures are logged here; callers skip the mod for this cycle.
    pub async fn fetch_latest(&self, mod_id: &str) -> Option<ChangelogRecord> {
        let url = self.changelog_url(mod_id);
        let request = self.client.get(&url).header(COOKIE, TIMEZONE_COOKIE);

        let page = match fetch_text(request).await {
            Ok(page) => page,
            Err(e) => {
                log::error!("Failed to retrieve the changelog page at {}: {}", url, e);
                return None;
            }
        };

        match parse_changelog(&page, Utc::now().year()) {
            Ok(changelog) => Some(changelog),
            Err(e) => {
                log::error!("Unusable changelog page at {}: {}", url, e);
                None
            }
        }
    }
}
