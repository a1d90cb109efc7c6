// src/services/identity.rs

//! Author identity resolution.
//!
//! Resolution walks an ordered list of strategies and takes the first one
//! that finds the author:
//! 1. `LinkedAccountStrategy` - a stored link to a chat-platform account
//! 2. `ProfileStrategy` - the community profile, cached per steam id

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::models::Identity;
use crate::services::directory::UserDirectory;
use crate::services::profile::{ProfileCache, ProfileSource};
use crate::storage::AuthorLinkStore;

/// Result of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Identity),
    NotFound,
}

/// One way of turning an author reference into an identity.
#[async_trait]
pub trait IdentityStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `fallback_name` is the author name printed on the listing card, possibly empty.
    async fn resolve(&self, steam_id: &str, fallback_name: &str) -> Resolution;
}

/// Identity from a linked chat-platform account.
///
/// A link to a user the platform no longer knows is deleted.
pub struct LinkedAccountStrategy {
    links: Arc<dyn AuthorLinkStore>,
    directory: Arc<dyn UserDirectory>,
}

impl LinkedAccountStrategy {
    pub fn new(links: Arc<dyn AuthorLinkStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { links, directory }
    }
}

#[async_trait]
impl IdentityStrategy for LinkedAccountStrategy {
    fn name(&self) -> &'static str {
        "linked-account"
    }

    async fn resolve(&self, steam_id: &str, _fallback_name: &str) -> Resolution {
        let discord_id = match self.links.lookup(steam_id).await {
            Ok(Some(discord_id)) => discord_id,
            Ok(None) => return Resolution::NotFound,
            Err(e) => {
                log::error!("Failed to look up author link for {}: {}", steam_id, e);
                return Resolution::NotFound;
            }
        };

        match self.directory.fetch_user(&discord_id).await {
            Ok(user) => {
                let avatar_url = user.avatar_url();
                Resolution::Found(Identity::linked(&discord_id, user.username, avatar_url))
            }
            Err(LookupError::NotFound) => {
                match self.links.delete_by_discord_id(&discord_id).await {
                    Ok(_) => log::warn!(
                        "Unable to find user with ID {}. ID removed from database.",
                        discord_id
                    ),
                    Err(e) => log::error!("Failed to remove link to {}: {}", discord_id, e),
                }
                Resolution::NotFound
            }
            Err(e) => {
                log::error!("Failed to fetch user {}: {}", discord_id, e);
                Resolution::NotFound
            }
        }
    }
}

/// Identity from the community profile.
///
/// Always produces an identity; a failed lookup leaves name or avatar unset.
pub struct ProfileStrategy {
    source: Arc<dyn ProfileSource>,
    cache: Arc<dyn ProfileCache>,
}

impl ProfileStrategy {
    pub fn new(source: Arc<dyn ProfileSource>, cache: Arc<dyn ProfileCache>) -> Self {
        Self { source, cache }
    }
}

#[async_trait]
impl IdentityStrategy for ProfileStrategy {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn resolve(&self, steam_id: &str, fallback_name: &str) -> Resolution {
        let profile = match self.cache.get(steam_id) {
            Some(profile) => Some(profile),
            None => match self.source.fetch_profile(steam_id).await {
                Ok(profile) => {
                    self.cache.insert(steam_id, profile.clone());
                    Some(profile)
                }
                Err(e) => {
                    log::error!("Failed to retrieve the profile of {}: {}", steam_id, e);
                    None
                }
            },
        };

        let (canonical_name, avatar_url) = match profile {
            Some(profile) => (Some(profile.display_name), Some(profile.avatar_url)),
            None => (None, None),
        };
        let display_name = non_empty(fallback_name).or(canonical_name);

        Resolution::Found(Identity::unlinked(display_name, avatar_url))
    }
}

/// Runs identity strategies in order.
pub struct IdentityResolver {
    strategies: Vec<Box<dyn IdentityStrategy>>,
}

impl IdentityResolver {
    pub fn new(strategies: Vec<Box<dyn IdentityStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolve the display identity of an author.
    pub async fn resolve(&self, steam_id: &str, fallback_name: &str) -> Identity {
        for strategy in &self.strategies {
            if let Resolution::Found(identity) = strategy.resolve(steam_id, fallback_name).await {
                log::debug!("Resolved {} via {}", steam_id, strategy.name());
                return identity;
            }
        }

        Identity::unlinked(non_empty(fallback_name), None)
    }
}

fn non_empty(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
