// src/models/identity.rs

//! Author identity records.

use serde::{Deserialize, Serialize};

/// Display identity of a mod author used in notifications.
///
/// Fields are optional because a failed profile lookup still lets the
/// announcement go out with whatever is known.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Platform mention token when the author is linked, display name otherwise
    pub mention: Option<String>,
}

impl Identity {
    /// Identity for a linked chat-platform account.
    pub fn linked(user_id: &str, username: String, avatar_url: Option<String>) -> Self {
        Self {
            display_name: Some(username),
            avatar_url,
            mention: Some(format!("<@{user_id}>")),
        }
    }

    /// Identity built from profile data only.
    pub fn unlinked(display_name: Option<String>, avatar_url: Option<String>) -> Self {
        Self {
            mention: display_name.clone(),
            display_name,
            avatar_url,
        }
    }
}

/// Canonical profile data fetched from the community site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorProfile {
    pub display_name: String,
    pub avatar_url: String,
}

/// A chat-platform user returned by a directory lookup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlatformUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl PlatformUser {
    /// CDN URL of the user's avatar, if one is set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_identity_uses_mention_token() {
        let identity = Identity::linked("42", "alice".to_string(), None);
        assert_eq!(identity.mention.as_deref(), Some("<@42>"));
        assert_eq!(identity.display_name.as_deref(), Some("alice"));
    }

    #[test]
    fn test_unlinked_identity_mentions_display_name() {
        let identity = Identity::unlinked(Some("Bob".to_string()), None);
        assert_eq!(identity.mention.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_platform_avatar_url() {
        let user = PlatformUser {
            id: "7".to_string(),
            username: "carol".to_string(),
            avatar: Some("abc".to_string()),
        };
        assert_eq!(
            user.avatar_url().as_deref(),
            Some("https://cdn.discordapp.com/avatars/7/abc.png")
        );
    }
}
