// src/services/directory.rs

//! Chat-platform user directory.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};

use crate::error::LookupError;
use crate::models::PlatformUser;

/// Lookup of chat-platform users by id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_user(&self, user_id: &str) -> Result<PlatformUser, LookupError>;
}

/// Discord REST user lookup authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct DiscordDirectory {
    client: Client,
    api_url: String,
    token: String,
}

impl DiscordDirectory {
    pub fn new(client: Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for DiscordDirectory {
    async fn fetch_user(&self, user_id: &str) -> Result<PlatformUser, LookupError> {
        let url = format!("{}/users/{}", self.api_url, user_id);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await
            .map_err(|e| LookupError::Failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(LookupError::NotFound),
            status if status.is_success() => response
                .json::<PlatformUser>()
                .await
                .map_err(|e| LookupError::Failed(e.to_string())),
            status => Err(LookupError::Failed(format!("status {status} from {url}"))),
        }
    }
}
