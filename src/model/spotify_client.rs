//! Spotify Web API client wrapper

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use rspotify::{
    model::{FullTrack, Market, PlayableId, SearchResult, SearchType, TrackId},
    prelude::*,
    AuthCodeSpotify, Token,
};
use tokio::sync::RwLock;

use crate::controller::PlaybackBackend;

use super::cache::LikedSongsCache;
use super::track::{track_uri, TrackRef};

/// Seconds of validity left below which the access token is refreshed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;
const LIKED_SONGS_SYNC_LIMIT: usize = 1000;

/// Spotify API client with liked-songs caching and token refresh support
#[derive(Clone)]
pub struct SpotifyClient {
    client: Arc<AuthCodeSpotify>,
    local_device_name: String,
    liked_songs_cache: LikedSongsCache,
    refresh_token: Arc<RwLock<String>>,
    token_expires_at: Arc<RwLock<Option<chrono::DateTime<chrono::Utc>>>>,
}

impl SpotifyClient {
    pub fn new(
        client: AuthCodeSpotify,
        local_device_name: String,
        refresh_token: String,
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            local_device_name,
            liked_songs_cache: LikedSongsCache::default(),
            refresh_token: Arc::new(RwLock::new(refresh_token)),
            token_expires_at: Arc::new(RwLock::new(expires_at)),
        }
    }

    // ========================================================================
    // Token
    // ========================================================================

    pub async fn token_needs_refresh(&self) -> bool {
        let expires_at = self.token_expires_at.read().await;
        match *expires_at {
            Some(exp) => (exp - chrono::Utc::now()).num_seconds() < TOKEN_REFRESH_MARGIN_SECS,
            None => false,
        }
    }

    pub async fn refresh_token_if_needed(&self) -> Result<bool> {
        if !self.token_needs_refresh().await {
            return Ok(false);
        }

        let refresh_token = self.refresh_token.read().await.clone();
        tracing::info!("Token expiring soon, refreshing...");

        let refreshed = match crate::auth::refresh_access_token(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh token");
                return Err(e);
            }
        };

        let new_token = Token {
            access_token: refreshed.access_token,
            expires_in: chrono::Duration::seconds(3600),
            expires_at: Some(refreshed.expires_at),
            scopes: crate::auth::SCOPES
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<HashSet<String>>(),
            refresh_token: None,
        };

        match self.client.token.lock().await {
            Ok(mut token) => *token = Some(new_token),
            Err(_) => return Err(anyhow::anyhow!("rspotify token lock poisoned")),
        }

        *self.refresh_token.write().await = refreshed.refresh_token;
        *self.token_expires_at.write().await = Some(refreshed.expires_at);

        tracing::info!("Token refreshed successfully");
        Ok(true)
    }

    // ========================================================================
    // Liked songs
    // ========================================================================

    /// Load the on-disk cache. Returns `false` when there was nothing to load.
    pub async fn init_liked_songs_cache(&self) -> bool {
        if !self.liked_songs_cache.exists_on_disk() {
            return false;
        }
        match self.liked_songs_cache.load_from_disk().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Liked songs cache unreadable");
                false
            }
        }
    }

    pub async fn refresh_liked_songs_cache(&self) -> Result<()> {
        use futures::StreamExt;
        use futures::TryStreamExt;

        tracing::debug!("Refreshing liked songs cache from API");

        let saved_tracks: Vec<_> = self
            .client
            .current_user_saved_tracks(None)
            .take(LIKED_SONGS_SYNC_LIMIT)
            .try_collect()
            .await?;

        let track_ids: Vec<String> = saved_tracks
            .into_iter()
            .filter_map(|saved| saved.track.id.map(|id| id.id().to_string()))
            .collect();

        tracing::info!(count = track_ids.len(), "Liked songs cache refreshed");
        self.liked_songs_cache.update(track_ids).await;
        self.save_liked_cache().await;
        Ok(())
    }

    pub async fn liked_ids(&self) -> HashSet<String> {
        self.liked_songs_cache.ids().await
    }

    /// Like or unlike a track. Returns the new liked status.
    pub async fn toggle_liked_song(&self, track_id: &str) -> Result<bool> {
        if track_id.is_empty() {
            return Err(anyhow::anyhow!("Track ID is empty"));
        }

        let id = TrackId::from_id(track_id)?;
        let liked = !self.liked_songs_cache.is_liked(track_id).await;

        if liked {
            tracing::debug!(track_id, "API: current_user_saved_tracks_add");
            self.client.current_user_saved_tracks_add([id]).await?;
        } else {
            tracing::debug!(track_id, "API: current_user_saved_tracks_delete");
            self.client.current_user_saved_tracks_delete([id]).await?;
        }

        self.liked_songs_cache.set_liked(track_id, liked).await;
        self.save_liked_cache().await;
        Ok(liked)
    }

    async fn save_liked_cache(&self) {
        if let Err(e) = self.liked_songs_cache.save_to_disk().await {
            tracing::warn!(error = %e, "Failed to save liked songs cache");
        }
    }

    // ========================================================================
    // Listings
    // ========================================================================

    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackRef>> {
        // None lets Spotify use the account's country
        let market: Option<Market> = None;
        tracing::debug!(query, limit, "API: search");

        let result = self
            .client
            .search(query, SearchType::Track, market, None, Some(limit), None)
            .await?;

        let tracks = match result {
            SearchResult::Tracks(page) => page.items.iter().filter_map(track_ref_from_full).collect(),
            _ => Vec::new(),
        };
        Ok(tracks)
    }

    pub async fn get_liked_tracks(&self, limit: u32) -> Result<Vec<TrackRef>> {
        use futures::StreamExt;
        use futures::TryStreamExt;

        let saved_tracks: Vec<_> = self
            .client
            .current_user_saved_tracks(None)
            .take(limit as usize)
            .try_collect()
            .await?;

        let tracks: Vec<TrackRef> = saved_tracks
            .iter()
            .filter_map(|saved| track_ref_from_full(&saved.track))
            .collect();

        for track in &tracks {
            self.liked_songs_cache.set_liked(&track.id, true).await;
        }
        Ok(tracks)
    }

    pub async fn get_recently_played(&self, limit: u32) -> Result<Vec<TrackRef>> {
        let history = self.client.current_user_recently_played(Some(limit), None).await?;
        Ok(history
            .items
            .iter()
            .filter_map(|item| track_ref_from_full(&item.track))
            .collect())
    }

    // ========================================================================
    // Devices
    // ========================================================================

    async fn find_device_id(&self, device_name: &str) -> Result<Option<String>> {
        let devices = self.client.device().await?;
        let device = devices.iter().find(|d| d.name == device_name);
        tracing::debug!(
            device_name,
            found = device.is_some(),
            available_devices = devices.len(),
            "Looked up device"
        );
        Ok(device.and_then(|d| d.id.clone()))
    }

    /// Device to play on: this player if registered, else whatever is active.
    async fn playback_device_id(&self) -> Option<String> {
        match self.client.device().await {
            Ok(devices) => devices
                .iter()
                .find(|d| d.name == self.local_device_name)
                .or_else(|| devices.iter().find(|d| d.is_active))
                .and_then(|d| d.id.clone()),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to get devices list");
                None
            }
        }
    }
}

impl PlaybackBackend for SpotifyClient {
    async fn play(&self, track_id: &str, position_ms: u32) -> Result<()> {
        let id = TrackId::from_id(track_id)?;
        let device_id = self.playback_device_id().await;
        tracing::debug!(track_id, position_ms, device_id = ?device_id, "API: start_uris_playback");

        self.client
            .start_uris_playback(
                [PlayableId::Track(id)],
                device_id.as_deref(),
                None,
                Some(chrono::Duration::milliseconds(position_ms as i64)),
            )
            .await?;
        Ok(())
    }

    async fn transfer_playback(&self, device_name: &str) -> Result<()> {
        let Some(device_id) = self.find_device_id(device_name).await? else {
            return Err(anyhow::anyhow!("Device {} not found", device_name));
        };
        tracing::debug!(device_id, "API: transfer_playback");
        self.client.transfer_playback(&device_id, Some(false)).await?;
        Ok(())
    }
}

/// Tracks without an id (local files) cannot be played through the API.
fn track_ref_from_full(track: &FullTrack) -> Option<TrackRef> {
    let id = track.id.as_ref()?.id().to_string();
    Some(TrackRef {
        uri: track_uri(&id),
        id,
        name: Some(track.name.clone()),
        artists: track.artists.iter().map(|a| a.name.clone()).collect(),
        album: Some(track.album.name.clone()),
        album_art: track.album.images.first().map(|image| image.url.clone()),
        duration_ms: Some(track.duration.num_milliseconds() as u32),
    })
}

