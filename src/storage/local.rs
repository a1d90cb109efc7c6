// src/storage/local.rs

//! Local filesystem storage implementation.
//!
//! Every table is a small JSON document rewritten atomically on change.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── cursor.json
//! ├── mods.json
//! └── author_links.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{AuthorLinkStore, CursorStore, ModStateStore};

const CURSOR_KEY: &str = "cursor.json";
const MODS_KEY: &str = "mods.json";
const LINKS_KEY: &str = "author_links.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorData {
    page_index: u32,
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Number of mods with a stored changelog marker.
    pub async fn tracked_mods(&self) -> Result<usize> {
        Ok(self.mods().await?.len())
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn mods(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read_json(MODS_KEY).await?.unwrap_or_default())
    }

    async fn links(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read_json(LINKS_KEY).await?.unwrap_or_default())
    }
}

#[async_trait]
impl CursorStore for LocalStorage {
    async fn get(&self) -> Result<u32> {
        Ok(self
            .read_json::<CursorData>(CURSOR_KEY)
            .await?
            .unwrap_or_default()
            .page_index)
    }

    async fn set(&self, page_index: u32) -> Result<()> {
        self.write_json(CURSOR_KEY, &CursorData { page_index }).await
    }
}

#[async_trait]
impl ModStateStore for LocalStorage {
    async fn exists(&self, mod_id: &str) -> Result<bool> {
        Ok(self.mods().await?.contains_key(mod_id))
    }

    async fn is_current(&self, mod_id: &str, changelog_id: &str) -> Result<bool> {
        Ok(self
            .mods()
            .await?
            .get(mod_id)
            .is_some_and(|last| last == changelog_id))
    }

    async fn insert(&self, mod_id: &str, changelog_id: &str) -> Result<bool> {
        let mut mods = self.mods().await?;
        if mods.contains_key(mod_id) {
            log::debug!("Mod {} already tracked", mod_id);
            return Ok(false);
        }

        mods.insert(mod_id.to_string(), changelog_id.to_string());
        self.write_json(MODS_KEY, &mods).await?;
        Ok(true)
    }

    async fn update(&self, mod_id: &str, changelog_id: &str) -> Result<bool> {
        let mut mods = self.mods().await?;
        match mods.get_mut(mod_id) {
            Some(last) if last == changelog_id => {}
            Some(last) => {
                *last = changelog_id.to_string();
                self.write_json(MODS_KEY, &mods).await?;
            }
            // Updating an untracked mod touches nothing, like an UPDATE matching no row.
            None => log::debug!("Update for untracked mod {}", mod_id),
        }
        Ok(true)
    }
}

#[async_trait]
impl AuthorLinkStore for LocalStorage {
    async fn lookup(&self, steam_id: &str) -> Result<Option<String>> {
        Ok(self.links().await?.remove(steam_id))
    }

    async fn insert(&self, steam_id: &str, discord_id: &str) -> Result<bool> {
        let mut links = self.links().await?;
        if links.contains_key(steam_id) {
            return Ok(false);
        }

        links.insert(steam_id.to_string(), discord_id.to_string());
        self.write_json(LINKS_KEY, &links).await?;
        Ok(true)
    }

    async fn delete_by_discord_id(&self, discord_id: &str) -> Result<usize> {
        let mut links = self.links().await?;
        let before = links.len();
        links.retain(|_, linked| linked != discord_id);

        let removed = before - links.len();
        if removed > 0 {
            self.write_json(LINKS_KEY, &links).await?;
        }
        Ok(removed)
    }
}
