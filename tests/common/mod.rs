#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scanner::error::{AppError, Result};
use scanner::models::{Config, WebhookMessage};
use scanner::services::NotificationSink;
use scanner::storage::LocalStorage;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One listing card.
pub struct Card {
    pub id: &'static str,
    pub steam_id: &'static str,
    pub author: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

impl Card {
    pub fn new(id: &'static str, steam_id: &'static str) -> Self {
        Self {
            id,
            steam_id,
            author: "",
            title: "Some Mod",
            description: "",
        }
    }

    pub fn author(mut self, author: &'static str) -> Self {
        self.author = author;
        self
    }

    pub fn title(mut self, title: &'static str) -> Self {
        self.title = title;
        self
    }
}

/// Render a browse page with `cards` newest first, the way the workshop lists
/// them. Only the first `images` cards carry a preview image.
pub fn listing_page(cards: &[Card], images: usize) -> String {
    let mut rendered: Vec<(u64, String)> = cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let preview = if index < images {
                format!(
                    r#"<img class="workshopItemPreviewImage " src="https://images.example.com/{}.jpg">"#,
                    card.id
                )
            } else {
                String::new()
            };
            let hover = serde_json::json!({
                "id": card.id,
                "title": card.title,
                "description": card.description,
                "appid": 341800,
            });
            let html = format!(
                r#"<div class="workshopItem">
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id={id}" class="ugc"><div id="sharedfile_{id}" class="workshopItemPreviewHolder ">{preview}</div></a>
<div class="workshopItemTitle ellipsis">{title}</div>
<div class="workshopItemAuthorName">by&nbsp;<a href="https://steamcommunity.com/{steam_id}/myworkshopfiles/?appid=341800">{author}</a></div>
</div>
<script>
SharedFileBindMouseHover( "sharedfile_{id}", false, {hover} );
</script>"#,
                title = card.title,
                steam_id = card.steam_id,
                author = card.author,
                id = card.id,
            );
            (card.id.parse().unwrap(), html)
        })
        .collect();
    rendered.sort_by(|a, b| b.0.cmp(&a.0));

    let items: Vec<String> = rendered.into_iter().map(|(_, html)| html).collect();
    format!(
        r#"<html><body>
<div class="workshopBrowseItems">
{}
</div>
</body></html>"#,
        items.join("\n")
    )
}

/// Render a changelog page whose newest entry is `id`.
pub fn changelog_page(id: &str, description: &str) -> String {
    format!(
        r#"<html><body>
<div class="workshopAnnouncement">
<div class="changelog headline">
Update: 12 Mar, 2024 @ 3:04pm
</div>
<div class="changeLogCtn">
<p id="{id}">{description}</p>
</div>
</div>
<div class="workshopAnnouncement">
<div class="changelog headline">
Update: 2 Jan, 2023 @ 10:00am
</div>
<div class="changeLogCtn">
<p id="1">Initial release</p>
</div>
</div>
</body></html>"#
    )
}

pub const PROFILE_NAME: &str = "Canonical Name";
pub const PROFILE_AVATAR: &str = "https://avatars.example.com/canonical.jpg";

pub async fn mount_listing(server: &MockServer, page: String) {
    Mock::given(method("GET"))
        .and(path("/workshop/browse/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
}

pub async fn mount_changelog(server: &MockServer, mod_id: &str, id: &str, description: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/sharedfiles/filedetails/changelog/{mod_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(changelog_page(id, description)))
        .mount(server)
        .await;
}

/// Every profile resolves to the same canonical name and avatar.
pub async fn mount_profiles(server: &MockServer) {
    let xml = format!(
        "<?xml version=\"1.0\"?><profile><steamID><![CDATA[{PROFILE_NAME}]]></steamID><avatarMedium><![CDATA[{PROFILE_AVATAR}]]></avatarMedium></profile>"
    );
    Mock::given(method("GET"))
        .and(path_regex(r"^/(id|profiles)/[^/]+$"))
        .and(query_param("xml", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .mount(server)
        .await;
}

/// Config pointing every upstream at `server`, without pauses.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.workshop.base_url = server.uri();
    config.identity.api_url = format!("{}/api", server.uri());
    config.crawler.request_delay_ms = 0;
    config.crawler.timeout_secs = 5;
    config
}

pub fn temp_storage() -> (TempDir, Arc<LocalStorage>) {
    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    (tmp, storage)
}

/// Sink that keeps every message it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    pub sent: Mutex<Vec<WebhookMessage>>,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<WebhookMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, message: &WebhookMessage) -> Result<()> {
        if self.fail {
            return Err(AppError::validation("webhook rejected the message"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
