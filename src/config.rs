//! Runtime configuration
//!
//! Read from the file named by `MELODFFY_CONFIG`, else `melodffy.toml` in the
//! working directory. Missing keys take their defaults; a missing or invalid
//! file falls back to defaults entirely.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

const CONFIG_ENV_VAR: &str = "MELODFFY_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "melodffy.toml";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval of the progress poll while a track is playing
    pub poll_interval_ms: u64,
    /// Where the playback snapshot and queue are persisted
    pub store_path: PathBuf,
    pub default_album_art: String,
    /// Name this player registers under in Spotify Connect
    pub device_name: String,
    pub search_limit: u32,
    pub liked_limit: u32,
    pub recent_limit: u32,
    pub initial_volume: u8,
    /// Treat "paused at position 0" as end of track, in addition to the
    /// player's own end-of-track event
    pub track_end_heuristic: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            store_path: PathBuf::from(".cache/session.json"),
            default_album_art: "/static/images/default_album_art.jpg".to_string(),
            device_name: "Melodffy".to_string(),
            search_limit: 20,
            liked_limit: 50,
            recent_limit: 20,
            initial_volume: 50,
            track_end_heuristic: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.initial_volume = config.initial_volume.min(100);
        if config.poll_interval_ms == 0 {
            config.poll_interval_ms = Self::default().poll_interval_ms;
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.store_path, PathBuf::from(".cache/session.json"));
        assert!(config.track_end_heuristic);
    }

    #[test]
    fn partial_file_overrides_keys() {
        let config = Config::from_toml(
            r#"
            poll_interval_ms = 250
            device_name = "Kitchen"
            initial_volume = 180
            track_end_heuristic = false
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.device_name, "Kitchen");
        assert_eq!(config.initial_volume, 100);
        assert!(!config.track_end_heuristic);
        assert_eq!(config.search_limit, 20);
    }

    #[test]
    fn zero_interval_is_replaced() {
        let config = Config::from_toml("poll_interval_ms = 0").unwrap();
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(Config::from_toml("search_limit = \"many\"").is_err());
    }
}
