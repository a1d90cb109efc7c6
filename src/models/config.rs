// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Workshop listing parameters
    #[serde(default)]
    pub workshop: WorkshopConfig,

    /// Author identity lookup settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Notification sinks
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Cycle cadence for `watch`
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override secrets from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("DISCORD_BOT_TOKEN") {
            self.identity.bot_token = Some(token);
        }
        if let Some(url) = non_empty("MAJOR_WEBHOOK_URL") {
            self.notifier.major_webhook = Some(url);
        }
        if let Some(url) = non_empty("MINOR_WEBHOOK_URL") {
            self.notifier.minor_webhook = Some(url);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.workshop.page_size == 0 {
            return Err(AppError::validation("workshop.page_size must be > 0"));
        }
        if self.workshop.sort_mode.trim().is_empty() {
            return Err(AppError::validation("workshop.sort_mode is empty"));
        }
        if self.notifier.description_limit == 0 {
            return Err(AppError::validation(
                "notifier.description_limit must be > 0",
            ));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }

        Url::parse(&self.workshop.base_url)?;
        Url::parse(&self.identity.api_url)?;
        for webhook in [&self.notifier.major_webhook, &self.notifier.minor_webhook]
            .into_iter()
            .flatten()
        {
            Url::parse(webhook)?;
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause between per-item requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Which catalog is crawled and how it is paged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopConfig {
    /// Community site root; every upstream URL is built from it
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Steam application id of the catalog
    #[serde(default = "defaults::app_id")]
    pub app_id: u32,

    #[serde(default = "defaults::sort_mode")]
    pub sort_mode: String,

    #[serde(default = "defaults::section")]
    pub section: String,

    /// Entries requested per listing page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,
}

impl WorkshopConfig {
    /// Base URL without a trailing slash.
    pub fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            app_id: defaults::app_id(),
            sort_mode: defaults::sort_mode(),
            section: defaults::section(),
            page_size: defaults::page_size(),
        }
    }
}

/// Chat-platform lookup and profile cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Bot token; linked-account lookups are disabled without it
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Profile cache entry lifetime; unset keeps entries for the process lifetime
    #[serde(default)]
    pub profile_cache_ttl_secs: Option<u64>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::api_url(),
            bot_token: None,
            profile_cache_ttl_secs: None,
        }
    }
}

/// Notification sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub major_webhook: Option<String>,

    #[serde(default)]
    pub minor_webhook: Option<String>,

    /// Log payloads instead of posting them
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum characters of description carried into an embed
    #[serde(default = "defaults::description_limit")]
    pub description_limit: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            major_webhook: None,
            minor_webhook: None,
            dry_run: false,
            description_limit: defaults::description_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between the start of two cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; WorkshopScanner/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        250
    }

    // Workshop defaults
    pub fn base_url() -> String {
        "https://steamcommunity.com".into()
    }
    pub fn app_id() -> u32 {
        341800
    }
    pub fn sort_mode() -> String {
        "mostrecent".into()
    }
    pub fn section() -> String {
        "readytouseitems".into()
    }
    pub fn page_size() -> u32 {
        30
    }

    // Identity defaults
    pub fn api_url() -> String {
        "https://discord.com/api/v10".into()
    }

    // Notifier defaults
    pub fn description_limit() -> usize {
        1000
    }

    pub fn interval() -> u64 {
        300
    }

    pub fn level() -> String {
        "info".into()
    }
}
