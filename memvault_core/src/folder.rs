//! Name → id resolution of destination folders.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::remote::{Lookup, ObjectKind, ObjectQuery, RemoteStore};

/// Resolved folder ids keyed by exact folder name.
///
/// Entries are never evicted. A folder deleted remotely after resolution stays
/// cached until the process exits (or the cache file is removed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCache {
    folders: HashMap<String, String>,
}

impl FolderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.folders.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.folders.insert(name.into(), id.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Load a cache written by [`FolderCache::save`]. A missing file is an empty cache.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read folder cache {}", path.display()))?;
        let cache = serde_json::from_str(&content)
            .with_context(|| format!("Invalid folder cache {}", path.display()))?;
        Ok(cache)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write folder cache {}", path.display()))?;
        Ok(())
    }
}

/// Finds a folder by name, creating it when absent.
#[derive(Debug, Default)]
pub struct FolderResolver {
    cache: FolderCache,
}

impl FolderResolver {
    #[must_use]
    pub const fn new(cache: FolderCache) -> Self {
        Self { cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &FolderCache {
        &self.cache
    }

    pub async fn resolve<S>(&mut self, store: &S, name: &str) -> anyhow::Result<String>
    where
        S: RemoteStore + ?Sized,
    {
        if let Some(id) = self.cache.get(name) {
            debug!("Folder '{name}' served from cache");
            return Ok(id.to_string());
        }

        let query = ObjectQuery::new(name, ObjectKind::Folder);
        let id = match store.find(&query).await? {
            Lookup::Found(folder) => {
                info!("Found folder '{name}' ({})", folder.id);
                folder.id
            }
            Lookup::NotFound => {
                let id = store.create_folder(name).await?;
                info!("Created folder '{name}' ({id})");
                id
            }
        };

        self.cache.insert(name, id.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("folder_cache.json");

        let mut cache = FolderCache::new();
        cache.insert("claude-memory", "folder-1");
        cache.save(&path).unwrap();

        let loaded = FolderCache::load(&path).unwrap();
        assert_eq!(loaded.get("claude-memory"), Some("folder-1"));
    }

    #[test]
    fn missing_cache_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FolderCache::load(&dir.path().join("absent.json")).unwrap();
        assert!(cache.is_empty());
    }
}
