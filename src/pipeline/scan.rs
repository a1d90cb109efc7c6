// src/pipeline/scan.rs

//! One crawl cycle over the workshop listing.
//!
//! A cycle reads the page cursor, scrapes that listing page, then walks its
//! items one at a time: resolve the author, fetch the latest changelog,
//! classify, announce. The cursor moves as follows:
//!
//! | Listing stage result     | Cursor            |
//! |--------------------------|-------------------|
//! | items processed          | `cursor + 1`      |
//! | transport or layout error| reset to `1`      |
//! | entry/image mismatch     | unchanged (retry) |
//!
//! Per-item failures never affect the cursor.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, ListingItem};
use crate::services::{
    ChangelogFetcher, Classifier, Dispatcher, DiscordDirectory, IdentityResolver,
    IdentityStrategy, LinkedAccountStrategy, ListingFetcher, ListingParser, LogSink,
    MemoryProfileCache, NotificationSink, PageSchema, ProfileCache, ProfileStrategy,
    SteamProfileFetcher, UserDirectory, WebhookSink,
};
use crate::storage::{CursorStore, LocalStorage, ModStateStore};
use crate::utils::http::create_async_client;

/// Counters for a cycle that reached the per-item loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Page index that was scraped
    pub page: u32,
    pub entries: usize,
    /// Items dropped because their changelog or state could not be read
    pub skipped: usize,
    pub announced: usize,
    pub failed_sends: usize,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Listing processed, cursor advanced.
    Completed(CycleStats),
    /// Listing unavailable or unreadable, cursor reset to 1.
    Reset { reason: String },
    /// Entries and images disagreed, cursor left for a retry.
    Retry { entries: usize, images: usize },
}

impl CycleOutcome {
    /// Key/value lines for a log summary.
    pub fn summary_items(&self) -> Vec<(&'static str, String)> {
        match self {
            CycleOutcome::Completed(stats) => vec![
                ("outcome", "completed".to_string()),
                ("page", stats.page.to_string()),
                ("entries", stats.entries.to_string()),
                ("skipped", stats.skipped.to_string()),
                ("announced", stats.announced.to_string()),
                ("failed sends", stats.failed_sends.to_string()),
            ],
            CycleOutcome::Reset { reason } => vec![
                ("outcome", "cursor reset".to_string()),
                ("reason", reason.clone()),
            ],
            CycleOutcome::Retry { entries, images } => vec![
                ("outcome", "retry same page".to_string()),
                ("entries", entries.to_string()),
                ("images", images.to_string()),
            ],
        }
    }
}

enum ItemOutcome {
    Skipped,
    Quiet,
    Announced,
    SendFailed,
}

/// Drives crawl cycles.
///
/// `run` takes `&mut self`, so one scanner can never run two cycles at once.
pub struct Scanner {
    cursor: Arc<dyn CursorStore>,
    mods: Arc<dyn ModStateStore>,
    fetcher: ListingFetcher,
    parser: ListingParser,
    changelogs: ChangelogFetcher,
    resolver: IdentityResolver,
    classifier: Classifier,
    dispatcher: Dispatcher,
    request_delay: Duration,
}

impl Scanner {
    pub fn builder(config: Config, storage: Arc<LocalStorage>) -> ScannerBuilder {
        ScannerBuilder::new(config, storage)
    }

    /// Scanner wired entirely from configuration.
    pub fn from_config(config: Config, storage: Arc<LocalStorage>) -> Result<Self> {
        ScannerBuilder::new(config, storage).build()
    }

    /// Run one cycle.
    pub async fn run(&mut self) -> Result<CycleOutcome> {
        let page = self.cursor.get().await?;

        let items = match self.scrape(page).await {
            Ok(items) => items,
            Err(AppError::Consistency { entries, images }) => {
                log::error!(
                    "Found {} entries but {} images on page {}, retrying the page next cycle",
                    entries,
                    images,
                    page
                );
                return Ok(CycleOutcome::Retry { entries, images });
            }
            Err(e) if e.is_transport() || matches!(e, AppError::Structure(_)) => {
                log::error!("Listing page {} unusable ({}), resetting cursor to 1", page, e);
                self.cursor.set(1).await?;
                return Ok(CycleOutcome::Reset {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let mut stats = CycleStats {
            page,
            entries: items.len(),
            ..CycleStats::default()
        };

        for (index, item) in items.iter().enumerate() {
            if index > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            match self.process(item).await {
                Ok(ItemOutcome::Quiet) => {}
                Ok(ItemOutcome::Announced) => stats.announced += 1,
                Ok(ItemOutcome::SendFailed) => stats.failed_sends += 1,
                Ok(ItemOutcome::Skipped) => stats.skipped += 1,
                Err(e) => {
                    log::warn!("Skipping mod {}: {}", item.entry.id, e);
                    stats.skipped += 1;
                }
            }
        }

        self.cursor.set(page.saturating_add(1)).await?;
        Ok(CycleOutcome::Completed(stats))
    }

    async fn scrape(&self, page: u32) -> Result<Vec<ListingItem>> {
        let body = self.fetcher.fetch(page).await?;
        self.parser.parse(&body)
    }

    async fn process(&self, item: &ListingItem) -> Result<ItemOutcome> {
        let entry = &item.entry;
        let identity = self
            .resolver
            .resolve(&entry.steam_id, &entry.author_name)
            .await;

        let Some(changelog) = self.changelogs.fetch_latest(&entry.id).await else {
            log::warn!("Skipping mod {}: no changelog available", entry.id);
            return Ok(ItemOutcome::Skipped);
        };

        let Some(announcement) = self
            .classifier
            .classify(self.mods.as_ref(), &entry.id, &changelog)
            .await?
        else {
            return Ok(ItemOutcome::Quiet);
        };

        let notification = self
            .dispatcher
            .build(announcement, item, &identity, &changelog);
        if self.dispatcher.send(&notification).await {
            log::info!(
                "Announced {} as {} ({})",
                entry.id,
                notification.severity.as_str(),
                entry.title
            );
            Ok(ItemOutcome::Announced)
        } else {
            Ok(ItemOutcome::SendFailed)
        }
    }
}

/// Assembles a [`Scanner`], with optional replacements for its collaborators.
pub struct ScannerBuilder {
    config: Config,
    storage: Arc<LocalStorage>,
    client: Option<Client>,
    directory: Option<Arc<dyn UserDirectory>>,
    sinks: Option<(Arc<dyn NotificationSink>, Arc<dyn NotificationSink>)>,
    profile_cache: Option<Arc<dyn ProfileCache>>,
}

impl ScannerBuilder {
    pub fn new(config: Config, storage: Arc<LocalStorage>) -> Self {
        Self {
            config,
            storage,
            client: None,
            directory: None,
            sinks: None,
            profile_cache: None,
        }
    }

    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Replace the major and minor sinks.
    pub fn sinks(
        mut self,
        major: Arc<dyn NotificationSink>,
        minor: Arc<dyn NotificationSink>,
    ) -> Self {
        self.sinks = Some((major, minor));
        self
    }

    pub fn profile_cache(mut self, cache: Arc<dyn ProfileCache>) -> Self {
        self.profile_cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Scanner> {
        let config = self.config;
        let client = match self.client {
            Some(client) => client,
            None => create_async_client(&config.crawler)?,
        };
        let root = config.workshop.root().to_string();

        let directory = self.directory.or_else(|| {
            config.identity.bot_token.as_ref().map(|token| {
                Arc::new(DiscordDirectory::new(
                    client.clone(),
                    config.identity.api_url.as_str(),
                    token.as_str(),
                )) as Arc<dyn UserDirectory>
            })
        });

        let mut strategies: Vec<Box<dyn IdentityStrategy>> = Vec::new();
        match directory {
            Some(directory) => strategies.push(Box::new(LinkedAccountStrategy::new(
                self.storage.clone(),
                directory,
            ))),
            None => log::info!("No bot token configured, linked accounts are not consulted"),
        }
        let cache: Arc<dyn ProfileCache> = match self.profile_cache {
            Some(cache) => cache,
            None => {
                let ttl = config.identity.profile_cache_ttl_secs.map(Duration::from_secs);
                Arc::new(MemoryProfileCache::new(ttl))
            }
        };
        strategies.push(Box::new(ProfileStrategy::new(
            Arc::new(SteamProfileFetcher::new(client.clone(), root.as_str())),
            cache,
        )));

        let (major, minor) = match self.sinks {
            Some(sinks) => sinks,
            None => default_sinks(&config, &client),
        };

        Ok(Scanner {
            cursor: self.storage.clone(),
            mods: self.storage,
            fetcher: ListingFetcher::new(client.clone(), config.workshop.clone()),
            parser: ListingParser::new(PageSchema::v1()?),
            changelogs: ChangelogFetcher::new(client, root.as_str()),
            resolver: IdentityResolver::new(strategies),
            classifier: Classifier::new(),
            dispatcher: Dispatcher::new(
                root,
                config.notifier.description_limit,
                major,
                minor,
            ),
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
        })
    }
}

fn default_sinks(
    config: &Config,
    client: &Client,
) -> (Arc<dyn NotificationSink>, Arc<dyn NotificationSink>) {
    let notifier = &config.notifier;
    if let (Some(major), Some(minor), false) = (
        &notifier.major_webhook,
        &notifier.minor_webhook,
        notifier.dry_run,
    ) {
        let major: Arc<dyn NotificationSink> =
            Arc::new(WebhookSink::new(client.clone(), major.as_str()));
        let minor: Arc<dyn NotificationSink> =
            Arc::new(WebhookSink::new(client.clone(), minor.as_str()));
        return (major, minor);
    }

    if !notifier.dry_run {
        log::warn!("Webhook URLs are not configured, notifications will only be logged");
    }
    let major: Arc<dyn NotificationSink> = Arc::new(LogSink::new("major"));
    let minor: Arc<dyn NotificationSink> = Arc::new(LogSink::new("minor"));
    (major, minor)
}
