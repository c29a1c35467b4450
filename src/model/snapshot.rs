//! Persisted playback snapshot used to restore the footer after a restart

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::track::TrackRef;

pub const KEY_CURRENT_TRACK: &str = "currentTrack";
pub const KEY_POSITION: &str = "currentTrackPosition";
pub const KEY_IS_PLAYING: &str = "isPlaying";
pub const KEY_QUEUE: &str = "queue";

/// Last known playback state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track: TrackRef,
    pub is_playing: bool,
    pub position_ms: u32,
}

/// String key/value storage that survives restarts.
pub trait SnapshotStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Read the snapshot. Missing or unparsable entries yield `None`.
pub fn load_snapshot(store: &dyn SnapshotStore) -> Option<PlaybackSnapshot> {
    let track: TrackRef = serde_json::from_str(&store.get(KEY_CURRENT_TRACK)?).ok()?;
    let position_ms = store
        .get(KEY_POSITION)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let is_playing = store.get(KEY_IS_PLAYING).as_deref() == Some("true");
    Some(PlaybackSnapshot {
        track,
        is_playing,
        position_ms,
    })
}

pub fn save_snapshot(store: &mut dyn SnapshotStore, snapshot: &PlaybackSnapshot) -> Result<()> {
    store.set(KEY_CURRENT_TRACK, serde_json::to_string(&snapshot.track)?)?;
    store.set(KEY_POSITION, snapshot.position_ms.to_string())?;
    store.set(KEY_IS_PLAYING, snapshot.is_playing.to_string())?;
    Ok(())
}

pub fn clear_snapshot(store: &mut dyn SnapshotStore) -> Result<()> {
    store.remove(KEY_CURRENT_TRACK)?;
    store.remove(KEY_POSITION)?;
    store.remove(KEY_IS_PLAYING)?;
    Ok(())
}

pub fn load_queue(store: &dyn SnapshotStore) -> Vec<TrackRef> {
    store
        .get(KEY_QUEUE)
        .and_then(|v| serde_json::from_str(&v).ok())
        .unwrap_or_default()
}

pub fn save_queue(store: &mut dyn SnapshotStore, queue: &[TrackRef]) -> Result<()> {
    store.set(KEY_QUEUE, serde_json::to_string(queue)?)
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON file holding all keys.
///
/// Changes are handed to a background writer; a burst of changes collapses
/// into one write of the latest contents.
pub struct FileStore {
    values: HashMap<String, String>,
    pending: watch::Sender<Option<String>>,
}

impl FileStore {
    /// Open the store, starting empty if the file is missing or corrupt.
    ///
    /// The returned handle completes once the store has been dropped and its
    /// last change is on disk.
    pub async fn open(path: impl AsRef<Path>) -> (Self, JoinHandle<()>) {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Session store unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        let (pending, changes) = watch::channel(None);
        let writer = tokio::spawn(write_changes(path, changes));
        (Self { values, pending }, writer)
    }

    fn schedule_write(&self) -> Result<()> {
        let content = serde_json::to_string(&self.values)?;
        self.pending.send_replace(Some(content));
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        if self.values.get(key) == Some(&value) {
            return Ok(());
        }
        self.values.insert(key.to_string(), value);
        self.schedule_write()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.schedule_write()?;
        }
        Ok(())
    }
}

/// Write every change that reaches `changes` until the store is dropped.
async fn write_changes(path: PathBuf, mut changes: watch::Receiver<Option<String>>) {
    while changes.changed().await.is_ok() {
        let latest = changes.borrow_and_update().clone();
        let Some(content) = latest else {
            continue;
        };
        if let Err(e) = write_file(&path, &content).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write session store");
        }
    }
    tracing::debug!(path = %path.display(), "Session store writer finished");
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).await?;
        }
    }
    fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PlaybackSnapshot {
        PlaybackSnapshot {
            track: TrackRef {
                name: Some("Song".into()),
                ..TrackRef::from_uri("spotify:track:abc")
            },
            is_playing: true,
            position_ms: 42_000,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("melodffy-test-{}-{}", std::process::id(), name))
            .join("session.json")
    }

    #[test]
    fn empty_store_has_no_snapshot() {
        let store = MemoryStore::new();
        assert!(load_snapshot(&store).is_none());
        assert!(load_queue(&store).is_empty());
    }

    #[test]
    fn snapshot_uses_fixed_keys() {
        let mut store = MemoryStore::new();
        save_snapshot(&mut store, &snapshot()).unwrap();

        assert_eq!(store.get(KEY_POSITION).as_deref(), Some("42000"));
        assert_eq!(store.get(KEY_IS_PLAYING).as_deref(), Some("true"));
        assert_eq!(load_snapshot(&store), Some(snapshot()));

        clear_snapshot(&mut store).unwrap();
        assert!(load_snapshot(&store).is_none());
    }

    #[test]
    fn corrupt_track_entry_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(KEY_CURRENT_TRACK, "[]".into()).unwrap();
        assert!(load_snapshot(&store).is_none());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let path = temp_path("reopen");
        let _ = std::fs::remove_file(&path);

        let (mut store, writer) = FileStore::open(&path).await;
        save_snapshot(&mut store, &snapshot()).unwrap();
        save_queue(&mut store, &[TrackRef::from_uri("spotify:track:q")]).unwrap();
        drop(store);
        writer.await.unwrap();

        let (store, _writer) = FileStore::open(&path).await;
        assert_eq!(load_snapshot(&store), Some(snapshot()));
        assert_eq!(load_queue(&store), vec![TrackRef::from_uri("spotify:track:q")]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn file_store_writes_latest_contents() {
        let path = temp_path("latest");
        let _ = std::fs::remove_file(&path);

        let (mut store, writer) = FileStore::open(&path).await;
        for position in [1_000u32, 2_000, 3_000] {
            store.set(KEY_POSITION, position.to_string()).unwrap();
        }
        store.remove(KEY_IS_PLAYING).unwrap();
        drop(store);
        writer.await.unwrap();

        let on_disk: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get(KEY_POSITION).map(String::as_str), Some("3000"));
        assert_eq!(on_disk.len(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn file_store_starts_empty_on_garbage() {
        let path = temp_path("garbage");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let (store, _writer) = FileStore::open(&path).await;
        assert!(store.get(KEY_QUEUE).is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
