//! Main application model with state management

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::controller::UiUpdate;

use super::content::ContentState;
use super::playback::PlaybackInfo;
use super::spotify_client::SpotifyClient;
use super::track::{TrackInfo, TrackRef};
use super::types::{ActiveSection, ContentTab, UiState};

const ERROR_DISPLAY_TIME: Duration = Duration::from_secs(5);

/// Main application model containing all UI state
pub struct AppModel {
    pub spotify: Option<SpotifyClient>,
    playback: Arc<Mutex<PlaybackInfo>>,
    pub ui_state: Arc<Mutex<UiState>>,
    pub content_state: Arc<Mutex<ContentState>>,
    pub should_quit: Arc<Mutex<bool>>,
    default_album_art: String,
}

impl AppModel {
    pub fn new(default_album_art: &str) -> Self {
        Self {
            spotify: None,
            playback: Arc::new(Mutex::new(PlaybackInfo::idle(default_album_art))),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            content_state: Arc::new(Mutex::new(ContentState::default())),
            should_quit: Arc::new(Mutex::new(false)),
            default_album_art: default_album_art.to_string(),
        }
    }

    pub fn set_spotify_client(&mut self, client: SpotifyClient) {
        self.spotify = Some(client);
    }

    pub async fn get_spotify_client(&self) -> Option<SpotifyClient> {
        self.spotify.clone()
    }

    // ========================================================================
    // Playback footer
    // ========================================================================

    pub async fn update_device_name(&self, name: String) {
        self.playback.lock().await.device_name = name;
    }

    /// Fold one reconciler update into the displayed state.
    pub async fn apply_ui_update(&self, update: UiUpdate) {
        match update {
            UiUpdate::Idle => {
                let mut playback = self.playback.lock().await;
                playback.track = TrackInfo::idle(&self.default_album_art);
                playback.is_playing = false;
                playback.progress_ms = 0;
                playback.duration_ms = 0;
            }
            UiUpdate::Track(info) => {
                let mut playback = self.playback.lock().await;
                if info.duration_ms > 0 {
                    playback.duration_ms = info.duration_ms;
                }
                playback.track = info;
            }
            UiUpdate::PlayPause { is_playing } => {
                self.playback.lock().await.is_playing = is_playing;
            }
            UiUpdate::Progress { position_ms, duration_ms } => {
                let mut playback = self.playback.lock().await;
                playback.progress_ms = position_ms;
                playback.duration_ms = duration_ms;
            }
            UiUpdate::Queue { tracks, current } => {
                let mut content = self.content_state.lock().await;
                content.queue.set_tracks(tracks);
                content.queue_current = current;
            }
            UiUpdate::Volume(volume) => {
                self.playback.lock().await.volume = volume;
            }
            UiUpdate::Alert(message) => {
                self.set_error(message).await;
            }
        }
    }

    pub async fn get_playback_info(&self) -> PlaybackInfo {
        self.playback.lock().await.clone()
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    // ========================================================================
    // Focus, search input and overlays
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn toggle_section(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.toggle();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        self.ui_state.lock().await.active_section = section;
    }

    pub async fn update_search_query(&self, query: String) {
        self.ui_state.lock().await.search_query = query;
    }

    pub async fn append_to_search(&self, c: char) {
        self.ui_state.lock().await.search_query.push(c);
    }

    pub async fn backspace_search(&self) {
        self.ui_state.lock().await.search_query.pop();
    }

    pub async fn set_error(&self, message: String) {
        tracing::warn!(message = %message, "Showing alert");
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if state
            .error_timestamp
            .is_some_and(|shown| shown.elapsed() >= ERROR_DISPLAY_TIME)
        {
            state.error_message = None;
            state.error_timestamp = None;
        }
    }

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    // ========================================================================
    // Listings
    // ========================================================================

    pub async fn get_content_state(&self) -> ContentState {
        self.content_state.lock().await.clone()
    }

    pub async fn active_tab(&self) -> ContentTab {
        self.content_state.lock().await.tab
    }

    pub async fn set_active_tab(&self, tab: ContentTab) {
        self.content_state.lock().await.tab = tab;
    }

    pub async fn next_tab(&self) -> ContentTab {
        let mut state = self.content_state.lock().await;
        state.tab = state.tab.next();
        state.tab
    }

    pub async fn prev_tab(&self) -> ContentTab {
        let mut state = self.content_state.lock().await;
        state.tab = state.tab.prev();
        state.tab
    }

    pub async fn set_content_loading(&self, loading: bool) {
        self.content_state.lock().await.is_loading = loading;
    }

    pub async fn set_listing(&self, tab: ContentTab, tracks: Vec<TrackRef>) {
        let mut state = self.content_state.lock().await;
        state.is_loading = false;
        let listing = state.listing_mut(tab);
        listing.set_tracks(tracks);
        listing.selected_index = 0;
    }

    pub async fn set_liked_ids(&self, ids: impl IntoIterator<Item = String>) {
        self.content_state.lock().await.liked_ids = ids.into_iter().collect();
    }

    pub async fn update_track_liked_status(&self, track_id: &str, liked: bool) {
        let mut state = self.content_state.lock().await;
        if liked {
            state.liked_ids.insert(track_id.to_string());
        } else {
            state.liked_ids.remove(track_id);
            state.liked.tracks.retain(|t| t.id != track_id);
            let len = state.liked.tracks.len();
            state.liked.selected_index = state.liked.selected_index.min(len.saturating_sub(1));
        }
    }

    pub async fn content_move_up(&self) {
        let mut state = self.content_state.lock().await;
        let tab = state.tab;
        state.listing_mut(tab).move_up();
    }

    pub async fn content_move_down(&self) {
        let mut state = self.content_state.lock().await;
        let tab = state.tab;
        state.listing_mut(tab).move_down();
    }

    /// Whole active listing and the selected index, for "play from here".
    pub async fn get_selected_listing(&self) -> Option<(Vec<TrackRef>, usize)> {
        let state = self.content_state.lock().await;
        let listing = state.active_listing();
        listing.selected()?;
        Some((listing.tracks.clone(), listing.selected_index))
    }

    pub async fn get_selected_track(&self) -> Option<TrackRef> {
        self.content_state.lock().await.active_listing().selected().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> TrackRef {
        TrackRef {
            name: Some(format!("Song {}", id)),
            duration_ms: Some(90_000),
            ..TrackRef::from_uri(&format!("spotify:track:{}", id))
        }
    }

    #[tokio::test]
    async fn idle_resets_the_footer() {
        let model = AppModel::new("/art.jpg");
        model
            .apply_ui_update(UiUpdate::Track(TrackInfo::from_track(&track("a"), "/art.jpg")))
            .await;
        model.apply_ui_update(UiUpdate::PlayPause { is_playing: true }).await;
        model
            .apply_ui_update(UiUpdate::Progress { position_ms: 30_000, duration_ms: 90_000 })
            .await;

        let info = model.get_playback_info().await;
        assert_eq!(info.track.name, "Song a");
        assert_eq!(info.remaining_ms(), 60_000);

        model.apply_ui_update(UiUpdate::Idle).await;
        let info = model.get_playback_info().await;
        assert!(info.track.is_idle());
        assert_eq!(info.track.album_art, "/art.jpg");
        assert!(!info.is_playing);
        assert_eq!((info.progress_ms, info.duration_ms), (0, 0));
    }

    #[tokio::test]
    async fn queue_update_fills_queue_tab() {
        let model = AppModel::new("/art.jpg");
        model
            .apply_ui_update(UiUpdate::Queue {
                tracks: vec![track("a"), track("b")],
                current: Some(1),
            })
            .await;

        let content = model.get_content_state().await;
        assert_eq!(content.queue.tracks.len(), 2);
        assert_eq!(content.queue_current, Some(1));
    }

    #[tokio::test]
    async fn alert_becomes_error_overlay() {
        let model = AppModel::new("/art.jpg");
        model.apply_ui_update(UiUpdate::Alert("boom".into())).await;
        assert!(model.has_error().await);

        model.auto_clear_old_errors().await;
        assert!(model.has_error().await);

        model.ui_state.lock().await.error_timestamp = Instant::now().checked_sub(ERROR_DISPLAY_TIME);
        model.auto_clear_old_errors().await;
        assert!(!model.has_error().await);
    }

    #[tokio::test]
    async fn selection_follows_active_tab() {
        let model = AppModel::new("/art.jpg");
        model.set_listing(ContentTab::Search, vec![track("a"), track("b"), track("c")]).await;
        model.set_active_tab(ContentTab::Search).await;
        model.content_move_down().await;
        model.content_move_down().await;

        let (tracks, index) = model.get_selected_listing().await.unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(index, 2);

        model.set_active_tab(ContentTab::Liked).await;
        assert!(model.get_selected_listing().await.is_none());
    }

    #[tokio::test]
    async fn unliking_drops_track_from_liked_tab() {
        let model = AppModel::new("/art.jpg");
        model.set_listing(ContentTab::Liked, vec![track("a"), track("b")]).await;
        model.set_liked_ids(["a".to_string(), "b".to_string()]).await;

        model.update_track_liked_status("b", false).await;

        let content = model.get_content_state().await;
        assert!(!content.is_liked("b"));
        assert_eq!(content.liked.tracks.len(), 1);
    }
}
