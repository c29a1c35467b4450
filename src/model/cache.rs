//! Cache of liked track ids, so listings can show likes without API calls

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

pub const LIKED_SONGS_CACHE_FILE: &str = ".cache/liked_songs.json";

#[derive(Clone)]
pub struct LikedSongsCache {
    path: PathBuf,
    liked_ids: Arc<RwLock<HashSet<String>>>,
}

impl LikedSongsCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            liked_ids: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn exists_on_disk(&self) -> bool {
        self.path.exists()
    }

    pub async fn load_from_disk(&self) -> Result<()> {
        if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            let ids: Vec<String> = serde_json::from_str(&content)?;
            *self.liked_ids.write().await = ids.into_iter().collect();
        }
        Ok(())
    }

    pub async fn save_to_disk(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let liked_ids = self.liked_ids.read().await;
        let mut ids: Vec<&String> = liked_ids.iter().collect();
        ids.sort();
        fs::write(&self.path, serde_json::to_string(&ids)?)?;
        Ok(())
    }

    pub async fn update(&self, track_ids: Vec<String>) {
        *self.liked_ids.write().await = track_ids.into_iter().collect();
    }

    pub async fn is_liked(&self, track_id: &str) -> bool {
        self.liked_ids.read().await.contains(track_id)
    }

    pub async fn set_liked(&self, track_id: &str, liked: bool) {
        let mut liked_ids = self.liked_ids.write().await;
        if liked {
            liked_ids.insert(track_id.to_string());
        } else {
            liked_ids.remove(track_id);
        }
    }

    pub async fn ids(&self) -> HashSet<String> {
        self.liked_ids.read().await.clone()
    }
}

impl Default for LikedSongsCache {
    fn default() -> Self {
        Self::new(LIKED_SONGS_CACHE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn likes_survive_a_reload() {
        let path = std::env::temp_dir()
            .join(format!("melodffy-liked-{}", std::process::id()))
            .join("liked.json");

        let cache = LikedSongsCache::new(&path);
        cache.update(vec!["a".into(), "b".into()]).await;
        cache.set_liked("b", false).await;
        cache.set_liked("c", true).await;
        cache.save_to_disk().await.unwrap();

        let reloaded = LikedSongsCache::new(&path);
        reloaded.load_from_disk().await.unwrap();
        assert!(reloaded.is_liked("a").await);
        assert!(!reloaded.is_liked("b").await);
        assert!(reloaded.is_liked("c").await);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let cache = LikedSongsCache::new("/nonexistent/melodffy/liked.json");
        assert!(cache.load_from_disk().await.is_ok());
        assert!(cache.ids().await.is_empty());
    }
}
