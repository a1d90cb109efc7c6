// src/services/classifier.rs

//! Change classification.
//!
//! Every mod is in one of three states relative to its latest changelog:
//!
//! | State       | Suppressed               | Not suppressed                     |
//! |-------------|--------------------------|------------------------------------|
//! | `Unseen`    | insert, stay quiet       | insert, announce as new (major)    |
//! | `UpToDate`  | nothing                  | nothing                            |
//! | `OutOfDate` | nothing                  | update, announce with severity     |
//!
//! Persistence happens before any announcement, and an announcement is only
//! produced when this call performed the insert or update. A suppressed
//! out-of-date mod keeps its old marker and is evaluated again next time.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::models::{Announcement, ChangelogRecord, NotificationKind, Severity};
use crate::storage::ModStateStore;

static SUPPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)no bot announcement|\[no ?announce\]|\[ignore\]").expect("suppression pattern")
});

static MAJOR_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)major change|major update|rule[- ]breaking change|manual reprint( is)? (?:required|necessary|needed)|manual update|updated? manual",
    )
    .expect("major change pattern")
});

/// Where a mod stands relative to its latest changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModState {
    Unseen,
    UpToDate,
    OutOfDate,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether the author asked for no announcement.
    pub fn is_suppressed(&self, description: &str) -> bool {
        SUPPRESSION.is_match(description)
    }

    /// Severity of an update, judged from its changelog text.
    pub fn update_severity(&self, description: &str) -> Severity {
        if MAJOR_CHANGE.is_match(description) {
            Severity::Major
        } else {
            Severity::Minor
        }
    }

    pub async fn state(
        &self,
        store: &dyn ModStateStore,
        mod_id: &str,
        changelog_id: &str,
    ) -> Result<ModState> {
        if !store.exists(mod_id).await? {
            return Ok(ModState::Unseen);
        }
        if store.is_current(mod_id, changelog_id).await? {
            Ok(ModState::UpToDate)
        } else {
            Ok(ModState::OutOfDate)
        }
    }

    /// Classify a mod, persist the transition and return what to announce.
    pub async fn classify(
        &self,
        store: &dyn ModStateStore,
        mod_id: &str,
        changelog: &ChangelogRecord,
    ) -> Result<Option<Announcement>> {
        let state = self.state(store, mod_id, &changelog.id).await?;
        let suppressed = self.is_suppressed(&changelog.description);

        match state {
            ModState::Unseen => {
                log::info!("Mod {} is new", mod_id);
                if !store.insert(mod_id, &changelog.id).await? {
                    log::info!("Mod {} was recorded concurrently, not announcing", mod_id);
                    return Ok(None);
                }
                if suppressed {
                    log::info!("Announcement for {} skipped because of an ignore tag", mod_id);
                    return Ok(None);
                }
                Ok(Some(Announcement {
                    kind: NotificationKind::New,
                    severity: Severity::Major,
                }))
            }
            ModState::UpToDate => {
                log::info!("Mod {} is up-to-date ({})", mod_id, changelog.id);
                Ok(None)
            }
            ModState::OutOfDate => {
                log::info!("Mod {} is not up-to-date ({})", mod_id, changelog.id);
                if suppressed {
                    log::info!("Announcement for {} skipped because of an ignore tag", mod_id);
                    return Ok(None);
                }
                if !store.update(mod_id, &changelog.id).await? {
                    return Ok(None);
                }
                Ok(Some(Announcement {
                    kind: NotificationKind::Updated,
                    severity: self.update_severity(&changelog.description),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use chrono::Utc;
    use tempfile::TempDir;

    fn changelog(id: &str, description: &str) -> ChangelogRecord {
        ChangelogRecord {
            date: Utc::now(),
            id: id.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_suppression_markers_any_case() {
        let classifier = Classifier::new();
        for text in [
            "No Bot Announcement please",
            "tiny fix [IGNORE]",
            "[no announce] typo",
            "[NoAnnounce]",
        ] {
            assert!(classifier.is_suppressed(text), "{text}");
        }
        assert!(!classifier.is_suppressed("Announce this [ignored]"));
    }

    #[test]
    fn test_update_severity_keywords() {
        let classifier = Classifier::new();
        for text in [
            "MAJOR UPDATE to the rules",
            "Rule-breaking change in setup",
            "rule breaking change",
            "Manual reprint is necessary",
            "manual reprint needed",
            "Updated manual attached",
        ] {
            assert_eq!(classifier.update_severity(text), Severity::Major, "{text}");
        }
        assert_eq!(classifier.update_severity("fixed a bug"), Severity::Minor);
    }

    #[tokio::test]
    async fn test_new_mod_is_inserted_and_announced_major() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let classifier = Classifier::new();

        let announcement = classifier
            .classify(&store, "A", &changelog("100", "first upload"))
            .await
            .unwrap();

        assert_eq!(
            announcement,
            Some(Announcement {
                kind: NotificationKind::New,
                severity: Severity::Major,
            })
        );
        assert!(store.is_current("A", "100").await.unwrap());
    }

    #[tokio::test]
    async fn test_same_changelog_twice_announces_once() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let classifier = Classifier::new();
        let record = changelog("100", "first upload");

        assert!(classifier.classify(&store, "A", &record).await.unwrap().is_some());
        assert!(classifier.classify(&store, "A", &record).await.unwrap().is_none());
        assert_eq!(
            classifier.state(&store, "A", "100").await.unwrap(),
            ModState::UpToDate
        );
    }

    #[tokio::test]
    async fn test_suppressed_new_mod_is_recorded_silently() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());

        let announcement = Classifier::new()
            .classify(&store, "A", &changelog("100", "[Ignore] test upload"))
            .await
            .unwrap();

        assert!(announcement.is_none());
        assert!(store.is_current("A", "100").await.unwrap());
    }

    #[tokio::test]
    async fn test_minor_update() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        ModStateStore::insert(&store, "B", "50").await.unwrap();

        let announcement = Classifier::new()
            .classify(&store, "B", &changelog("51", "fixed a bug"))
            .await
            .unwrap();

        assert_eq!(
            announcement,
            Some(Announcement {
                kind: NotificationKind::Updated,
                severity: Severity::Minor,
            })
        );
        assert!(store.is_current("B", "51").await.unwrap());
    }

    #[tokio::test]
    async fn test_major_update() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        ModStateStore::insert(&store, "B", "50").await.unwrap();

        let announcement = Classifier::new()
            .classify(&store, "B", &changelog("51", "Manual reprint required!"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(announcement.severity, Severity::Major);
    }

    #[tokio::test]
    async fn test_suppressed_update_keeps_old_marker() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        ModStateStore::insert(&store, "B", "50").await.unwrap();
        let classifier = Classifier::new();

        let announcement = classifier
            .classify(&store, "B", &changelog("51", "typo [no announce]"))
            .await
            .unwrap();

        assert!(announcement.is_none());
        assert!(store.is_current("B", "50").await.unwrap());
        assert_eq!(
            classifier.state(&store, "B", "51").await.unwrap(),
            ModState::OutOfDate
        );
    }
}
