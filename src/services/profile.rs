// src/services/profile.rs

//! Community profile lookup and the profile cache.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::AuthorProfile;
use crate::utils::http::fetch_text;

const NAME_TAG: &[u8] = b"steamID";
const AVATAR_TAG: &[u8] = b"avatarMedium";

/// Source of canonical author profiles.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, steam_id: &str) -> Result<AuthorProfile>;
}

/// Parse the XML profile document.
///
/// The first occurrence of each element wins; group entries further down
/// the document reuse the same element names.
pub fn parse_profile(xml: &str) -> Result<AuthorProfile> {
    let mut reader = Reader::from_str(xml);
    let mut current: Option<Vec<u8>> = None;
    let mut display_name: Option<String> = None;
    let mut avatar_url: Option<String> = None;

    loop {
        let text = match reader.read_event()? {
            Event::Start(start) => {
                current = Some(start.name().as_ref().to_vec());
                continue;
            }
            Event::End(_) => {
                current = None;
                continue;
            }
            Event::Text(text) => text.unescape()?.trim().to_string(),
            Event::CData(data) => String::from_utf8_lossy(&data.into_inner()).trim().to_string(),
            Event::Eof => break,
            _ => continue,
        };

        if text.is_empty() {
            continue;
        }
        let slot = match current.as_deref() {
            Some(NAME_TAG) => &mut display_name,
            Some(AVATAR_TAG) => &mut avatar_url,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    match (display_name, avatar_url) {
        (Some(display_name), Some(avatar_url)) => Ok(AuthorProfile {
            display_name,
            avatar_url,
        }),
        _ => Err(AppError::structure(
            "Profile document lacks steamID or avatarMedium",
        )),
    }
}

/// Fetches `?xml=1` profile documents from the community site.
#[derive(Debug, Clone)]
pub struct SteamProfileFetcher {
    client: Client,
    root: String,
}

impl SteamProfileFetcher {
    pub fn new(client: Client, root: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }
}

#[async_trait]
impl ProfileSource for SteamProfileFetcher {
    async fn fetch_profile(&self, steam_id: &str) -> Result<AuthorProfile> {
        let url = format!("{}/{}", self.root, steam_id);
        let xml = fetch_text(self.client.get(&url).query(&[("xml", "1")])).await?;
        parse_profile(&xml)
    }
}

/// Key-value store for fetched profiles, keyed by steam id.
pub trait ProfileCache: Send + Sync {
    fn get(&self, steam_id: &str) -> Option<AuthorProfile>;
    fn insert(&self, steam_id: &str, profile: AuthorProfile);
}

/// In-memory profile cache.
///
/// Without a TTL entries live as long as the cache; nothing is evicted.
#[derive(Debug, Default)]
pub struct MemoryProfileCache {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, (Instant, AuthorProfile)>>,
}

impl MemoryProfileCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfileCache for MemoryProfileCache {
    fn get(&self, steam_id: &str) -> Option<AuthorProfile> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let (stored_at, _) = entries.get(steam_id)?;

        if self.ttl.is_some_and(|ttl| stored_at.elapsed() >= ttl) {
            entries.remove(steam_id);
            return None;
        }
        entries.get(steam_id).map(|(_, profile)| profile.clone())
    }

    fn insert(&self, steam_id: &str, profile: AuthorProfile) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(steam_id.to_string(), (Instant::now(), profile));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_XML: &str = include_str!("../../tests/fixtures/profile.xml");

    fn profile(name: &str) -> AuthorProfile {
        AuthorProfile {
            display_name: name.to_string(),
            avatar_url: format!("https://avatars.example.com/{name}.jpg"),
        }
    }

    #[test]
    fn test_parse_profile_fixture() {
        let parsed = parse_profile(PROFILE_XML).unwrap();
        assert_eq!(parsed.display_name, "Bob the Builder");
        assert_eq!(
            parsed.avatar_url,
            "https://avatars.example.com/bob_medium.jpg"
        );
    }

    #[test]
    fn test_parse_profile_plain_text_elements() {
        let xml = "<profile><steamID>Dave &amp; Eve</steamID><avatarMedium>https://a/b.jpg</avatarMedium></profile>";
        let parsed = parse_profile(xml).unwrap();
        assert_eq!(parsed.display_name, "Dave & Eve");
        assert_eq!(parsed.avatar_url, "https://a/b.jpg");
    }

    #[test]
    fn test_parse_profile_error_document() {
        let xml = "<response><error><![CDATA[The specified profile could not be found.]]></error></response>";
        assert!(matches!(
            parse_profile(xml).unwrap_err(),
            AppError::Structure(_)
        ));
    }

    #[test]
    fn test_cache_without_ttl_keeps_entries() {
        let cache = MemoryProfileCache::default();
        assert!(cache.get("id/bob").is_none());

        cache.insert("id/bob", profile("bob"));
        assert_eq!(cache.get("id/bob"), Some(profile("bob")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_ttl_expires_entries() {
        let cache = MemoryProfileCache::new(Some(Duration::ZERO));
        cache.insert("id/bob", profile("bob"));

        assert!(cache.get("id/bob").is_none());
        assert!(cache.is_empty());
    }
}
