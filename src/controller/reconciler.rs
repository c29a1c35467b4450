//! Playback state reconciler
//!
//! Single consumer of the session channel. It owns the queue cursor and the
//! playback snapshot, turns player notifications into UI updates, detects
//! the end of a track and starts the next one from the queue.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Config;
use crate::error::PlayError;
use crate::model::snapshot::{self, PlaybackSnapshot, SnapshotStore};
use crate::model::{parse_track_uri, PlayerState, QueueCursor, TrackInfo, TrackRef};

use super::events::{Command, Envelope, SdkEvent, SessionEvent};
use super::progress::ProgressPoller;
use super::traits::{PlaybackBackend, PlayerSdk, UiSink, UiUpdate};

const NO_TRACK_TO_RESUME: &str = "No track available to play. Please select a track.";

pub struct Reconciler<B: PlaybackBackend> {
    backend: B,
    sdk: Arc<dyn PlayerSdk>,
    ui: Arc<dyn UiSink>,
    store: Box<dyn SnapshotStore>,
    poller: ProgressPoller,
    queue: QueueCursor,
    snapshot: Option<PlaybackSnapshot>,
    /// Snapshot read at start-up, replayed once the player is ready
    pending_resume: Option<PlaybackSnapshot>,
    last_applied_seq: u64,
    /// URI of a finished track whose successor was already requested
    ended_uri: Option<String>,
    volume: u8,
    default_album_art: String,
    track_end_heuristic: bool,
}

impl<B: PlaybackBackend> Reconciler<B> {
    pub fn new(
        config: &Config,
        backend: B,
        sdk: Arc<dyn PlayerSdk>,
        ui: Arc<dyn UiSink>,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        let poller = ProgressPoller::new(sdk.clone(), ui.clone(), config.poll_interval());
        Self {
            backend,
            sdk,
            ui,
            store,
            poller,
            queue: QueueCursor::new(),
            snapshot: None,
            pending_resume: None,
            last_applied_seq: 0,
            ended_uri: None,
            volume: config.initial_volume,
            default_album_art: config.default_album_art.clone(),
            track_end_heuristic: config.track_end_heuristic,
        }
    }

    #[cfg(test)]
    pub fn queue(&self) -> &QueueCursor {
        &self.queue
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        self.snapshot.as_ref()
    }

    /// Consume the session channel until it closes or a shutdown arrives.
    pub async fn run(mut self, mut events: UnboundedReceiver<Envelope>) {
        self.restore();
        tracing::info!("Reconciler started");

        while let Some(envelope) = events.recv().await {
            if !self.handle(envelope).await {
                break;
            }
        }

        self.poller.stop();
        tracing::info!("Reconciler stopped");
    }

    /// Load the persisted queue and snapshot and show them before the player
    /// connects.
    pub fn restore(&mut self) {
        let stored_queue = snapshot::load_queue(self.store.as_ref());
        if !stored_queue.is_empty() {
            tracing::debug!(len = stored_queue.len(), "Restored queue");
            self.queue.set_queue(stored_queue);
        }

        if let Some(stored) = snapshot::load_snapshot(self.store.as_ref()) {
            tracing::info!(uri = %stored.track.uri, position_ms = stored.position_ms, "Restored last track");
            if let Some(index) = self.queue.position_of_uri(&stored.track.uri) {
                self.queue.set_current_index(index);
            }
            let info = TrackInfo::from_track(&stored.track, &self.default_album_art);
            self.ui.apply(UiUpdate::Progress {
                position_ms: stored.position_ms.min(info.duration_ms),
                duration_ms: info.duration_ms,
            });
            self.ui.apply(UiUpdate::Track(info));
            self.ui.apply(UiUpdate::PlayPause { is_playing: stored.is_playing });
            self.snapshot = Some(stored.clone());
            self.pending_resume = Some(stored);
        }

        self.emit_queue();
        self.ui.apply(UiUpdate::Volume(self.volume));
    }

    /// Apply one envelope. Returns `false` when the loop should stop.
    pub async fn handle(&mut self, envelope: Envelope) -> bool {
        match envelope.event {
            SessionEvent::Sdk(event) => {
                let gated = matches!(event, SdkEvent::StateChanged(_) | SdkEvent::TrackEnded { .. });
                if gated && envelope.seq <= self.last_applied_seq {
                    tracing::debug!(
                        seq = envelope.seq,
                        last_applied = self.last_applied_seq,
                        "Dropping stale player notification"
                    );
                    return true;
                }
                self.last_applied_seq = self.last_applied_seq.max(envelope.seq);
                self.on_sdk_event(event).await;
                true
            }
            SessionEvent::Command(command) => {
                self.last_applied_seq = self.last_applied_seq.max(envelope.seq);
                if matches!(command, Command::Shutdown) {
                    return false;
                }
                self.on_command(command).await;
                true
            }
        }
    }

    async fn on_sdk_event(&mut self, event: SdkEvent) {
        match event {
            SdkEvent::Ready { device_name } => self.on_ready(&device_name).await,
            SdkEvent::StateChanged(state) => self.on_state_changed(state).await,
            SdkEvent::TrackEnded { uri } => {
                tracing::debug!(uri = %uri, "Player reported end of track");
                self.on_track_ended(&uri).await;
            }
            SdkEvent::Error { message } => {
                tracing::error!(message = %message, "Player error");
            }
        }
    }

    async fn on_ready(&mut self, device_name: &str) {
        tracing::info!(device_name, "Player ready");
        if let Err(e) = self.backend.transfer_playback(device_name).await {
            tracing::warn!(error = %e, "Failed to transfer playback to this device");
        }
        self.set_volume(self.volume);

        if let Some(stored) = self.pending_resume.take() {
            if stored.is_playing {
                tracing::info!(uri = %stored.track.uri, position_ms = stored.position_ms, "Resuming last track");
                let _ = self.request_play(stored.track, stored.position_ms).await;
            }
        }
    }

    async fn on_state_changed(&mut self, state: Option<PlayerState>) {
        let Some(state) = state else {
            self.go_idle();
            return;
        };

        if self.looks_like_track_end(&state) && self.on_track_ended(&state.track.uri).await {
            return;
        }

        self.apply_steady_state(state);
    }

    /// Paused at 0 reads as a finished track only when that track was last
    /// seen playing, or its end was already handled. A paused track the user
    /// seeks back to the start stays put.
    fn looks_like_track_end(&self, state: &PlayerState) -> bool {
        if !self.track_end_heuristic || state.position_ms != 0 || !state.paused {
            return false;
        }
        let uri = state.track.uri.as_str();
        self.ended_uri.as_deref() == Some(uri)
            || self
                .snapshot
                .as_ref()
                .is_some_and(|s| s.is_playing && s.track.uri == uri)
    }

    /// Advance past a finished track. Returns `true` when the next track was
    /// requested (or already had been), in which case the notification must
    /// not be rendered.
    async fn on_track_ended(&mut self, uri: &str) -> bool {
        if self.ended_uri.as_deref() == Some(uri) {
            tracing::trace!(uri, "End of track already handled");
            return true;
        }

        let Some(next) = self.queue.advance().cloned() else {
            tracing::info!(uri, "Reached the end of the queue");
            return false;
        };

        tracing::info!(ended = uri, next = %next.uri, "Track ended, playing next in queue");
        self.ended_uri = Some(uri.to_string());
        self.poller.stop();
        self.emit_queue();
        let _ = self.request_play(next, 0).await;
        true
    }

    fn apply_steady_state(&mut self, state: PlayerState) {
        let is_playing = state.is_playing();
        if is_playing {
            self.ended_uri = None;
            self.pending_resume = None;
        }

        self.sync_cursor(&state.track.uri);

        let mut track = state.track;
        if track.duration_ms.is_none() && state.duration_ms > 0 {
            track.duration_ms = Some(state.duration_ms);
        }
        let info = TrackInfo::from_track(&track, &self.default_album_art);
        let duration_ms = if state.duration_ms > 0 { state.duration_ms } else { info.duration_ms };

        self.save_snapshot(PlaybackSnapshot {
            track,
            is_playing,
            position_ms: state.position_ms,
        });

        self.ui.apply(UiUpdate::Track(info));
        self.ui.apply(UiUpdate::PlayPause { is_playing });

        if is_playing {
            self.poller.start(state.position_ms, duration_ms);
        } else {
            self.poller.stop();
            self.ui.apply(UiUpdate::Progress {
                position_ms: state.position_ms.min(duration_ms),
                duration_ms,
            });
        }
    }

    /// Point the cursor at the playing track when it was selected outside
    /// the normal next/previous flow.
    fn sync_cursor(&mut self, uri: &str) {
        if self.queue.current_item().is_some_and(|t| t.uri == uri) {
            return;
        }
        if let Some(index) = self.queue.position_of_uri(uri) {
            tracing::debug!(uri, index, "Resynchronising queue cursor");
            self.queue.set_current_index(index);
            self.emit_queue();
        }
    }

    fn go_idle(&mut self) {
        tracing::debug!("No playback state, going idle");
        self.poller.stop();
        self.snapshot = None;
        if let Err(e) = snapshot::clear_snapshot(self.store.as_mut()) {
            tracing::warn!(error = %e, "Failed to clear playback snapshot");
        }
        self.ui.apply(UiUpdate::Idle);
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::PlayFrom { tracks, index } => {
                if index >= tracks.len() {
                    tracing::warn!(index, len = tracks.len(), "Selected index outside listing");
                    return;
                }
                self.queue.set_queue(tracks);
                self.queue.set_current_index(index);
                self.queue_changed();
                if let Some(track) = self.queue.current_item().cloned() {
                    let _ = self.request_play(track, 0).await;
                }
            }
            Command::PlayAt { index, uri } => {
                let index = match self.queue.queue().get(index) {
                    Some(track) if track.uri == uri => Some(index),
                    _ => self.queue.position_of_uri(&uri),
                };
                let Some(index) = index.filter(|&i| self.queue.set_current_index(i)) else {
                    tracing::warn!(uri = %uri, "Selected entry is no longer in the queue");
                    return;
                };
                tracing::debug!(uri = %uri, index, "Jumping to queue entry");
                self.emit_queue();
                if let Some(track) = self.queue.current_item().cloned() {
                    let _ = self.request_play(track, 0).await;
                }
            }
            Command::Enqueue(tracks) => {
                tracing::info!(count = tracks.len(), "Adding tracks to queue");
                self.queue.append(tracks);
                self.queue_changed();
            }
            Command::RemoveFromQueue { id } => {
                let removed = self.queue.remove_by_id(&id);
                tracing::info!(id = %id, removed, "Removed track from queue");
                if removed > 0 {
                    self.queue_changed();
                }
            }
            Command::Next => match self.queue.advance().cloned() {
                Some(track) => {
                    self.emit_queue();
                    let _ = self.request_play(track, 0).await;
                }
                None => tracing::info!("No next track, at the end of the queue"),
            },
            Command::Previous => match self.queue.retreat().cloned() {
                Some(track) => {
                    self.emit_queue();
                    let _ = self.request_play(track, 0).await;
                }
                None => tracing::info!("No previous track, at the start of the queue"),
            },
            Command::TogglePlay => self.toggle_play().await,
            Command::Seek { position_ms } => self.seek(position_ms),
            Command::SeekBy { offset_ms } => {
                let Some(state) = self.sdk.current_state() else {
                    tracing::debug!("Nothing loaded, ignoring seek");
                    return;
                };
                let target = (state.position_ms as i64 + offset_ms).clamp(0, state.duration_ms as i64);
                self.seek(target as u32);
            }
            Command::SetVolume { percent } => self.set_volume(percent),
            Command::ChangeVolume { delta } => {
                let percent = (self.volume as i16 + delta).clamp(0, 100) as u8;
                self.set_volume(percent);
            }
            Command::Shutdown => {}
        }
    }

    /// Start playback of `track` through the backend.
    ///
    /// Malformed URIs are rejected before any network call. Failures are
    /// reported to the UI as an alert and returned to the caller.
    pub async fn request_play(&mut self, track: TrackRef, position_ms: u32) -> Result<(), PlayError> {
        let Some(track_id) = parse_track_uri(&track.uri) else {
            tracing::error!(uri = %track.uri, "Invalid track URI");
            let err = PlayError::InvalidTrack(track.uri.clone());
            self.ui.apply(UiUpdate::Alert(err.to_string()));
            return Err(err);
        };

        self.pending_resume = None;
        tracing::debug!(uri = %track.uri, position_ms, "Requesting playback");

        match self.backend.play(track_id, position_ms).await {
            Ok(()) => {
                tracing::info!(uri = %track.uri, "Track started playing");
                self.save_snapshot(PlaybackSnapshot {
                    track,
                    is_playing: true,
                    position_ms,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(uri = %track.uri, error = %e, "Failed to play track");
                let err = PlayError::from_backend(e);
                self.ui.apply(UiUpdate::Alert(err.to_string()));
                Err(err)
            }
        }
    }

    async fn toggle_play(&mut self) {
        if self.sdk.current_state().is_none() {
            // Nothing loaded in the player: resume the last known track
            let stored = self.pending_resume.clone().or_else(|| self.snapshot.clone());
            match stored {
                Some(stored) => {
                    let _ = self.request_play(stored.track, stored.position_ms).await;
                }
                None => {
                    tracing::warn!("No track available to resume");
                    self.ui.apply(UiUpdate::Alert(NO_TRACK_TO_RESUME.to_string()));
                }
            }
            return;
        }

        match self.sdk.toggle_play() {
            Ok(()) => {
                tracing::debug!("Toggled playback state");
                if let Some(mut current) = self.snapshot.clone() {
                    current.is_playing = !current.is_playing;
                    self.save_snapshot(current);
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to toggle playback"),
        }
    }

    fn seek(&mut self, position_ms: u32) {
        if let Err(e) = self.sdk.seek(position_ms) {
            tracing::error!(position_ms, error = %e, "Failed to seek");
            return;
        }
        tracing::debug!(position_ms, "Seeked");

        if let Some(mut current) = self.snapshot.clone() {
            current.position_ms = position_ms;
            let duration_ms = current.track.duration_ms.unwrap_or(0);
            let is_playing = current.is_playing;
            self.save_snapshot(current);
            if is_playing {
                self.poller.start(position_ms, duration_ms);
            } else {
                self.ui.apply(UiUpdate::Progress {
                    position_ms: position_ms.min(duration_ms),
                    duration_ms,
                });
            }
        }
    }

    fn set_volume(&mut self, percent: u8) {
        let percent = percent.min(100);
        match self.sdk.set_volume(percent) {
            Ok(()) => {
                tracing::debug!(percent, "Volume set");
                self.volume = percent;
                self.ui.apply(UiUpdate::Volume(percent));
            }
            Err(e) => tracing::error!(percent, error = %e, "Failed to set volume"),
        }
    }

    fn save_snapshot(&mut self, current: PlaybackSnapshot) {
        if let Err(e) = snapshot::save_snapshot(self.store.as_mut(), &current) {
            tracing::warn!(error = %e, "Failed to persist playback snapshot");
        }
        self.snapshot = Some(current);
    }

    fn queue_changed(&mut self) {
        self.pending_resume = None;
        if let Err(e) = snapshot::save_queue(self.store.as_mut(), self.queue.queue()) {
            tracing::warn!(error = %e, "Failed to persist queue");
        }
        self.emit_queue();
    }

    fn emit_queue(&self) {
        self.ui.apply(UiUpdate::Queue {
            tracks: self.queue.queue().to_vec(),
            current: self.queue.current_index(),
        });
    }
}
