//! Player state as reported by the playback SDK, and local timing for it

use std::time::Instant;

use super::track::{TrackInfo, TrackRef};

/// One "player state changed" notification from the SDK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub track: TrackRef,
    pub position_ms: u32,
    pub duration_ms: u32,
    pub paused: bool,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        !self.paused
    }
}

/// Tracks the position of the loaded track between SDK events so the
/// current state can be answered without a round trip.
#[derive(Clone, Debug)]
pub struct PlaybackTiming {
    pub track: Option<TrackRef>,
    pub position_ms: u32,
    pub last_update: Instant,
    pub is_playing: bool,
    pub duration_ms: u32,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            track: None,
            position_ms: 0,
            last_update: Instant::now(),
            is_playing: false,
            duration_ms: 0,
        }
    }
}

impl PlaybackTiming {
    pub fn current_position_ms(&self) -> u32 {
        if self.is_playing && self.duration_ms > 0 {
            let elapsed = self.last_update.elapsed().as_millis() as u32;
            self.position_ms.saturating_add(elapsed).min(self.duration_ms)
        } else {
            self.position_ms
        }
    }

    pub fn load_track(&mut self, track: TrackRef, duration_ms: u32) {
        self.track = Some(track);
        self.duration_ms = duration_ms;
        self.position_ms = 0;
        self.last_update = Instant::now();
    }

    pub fn update_position(&mut self, position_ms: u32, is_playing: bool) {
        self.position_ms = position_ms;
        self.is_playing = is_playing;
        self.last_update = Instant::now();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Snapshot as a state notification; `None` when no track is loaded.
    pub fn to_state(&self) -> Option<PlayerState> {
        let track = self.track.clone()?;
        Some(PlayerState {
            track,
            position_ms: self.current_position_ms(),
            duration_ms: self.duration_ms,
            paused: !self.is_playing,
        })
    }
}

/// What the footer shows
#[derive(Clone, Debug)]
pub struct PlaybackInfo {
    pub track: TrackInfo,
    pub progress_ms: u32,
    pub duration_ms: u32,
    pub is_playing: bool,
    pub volume: u8,
    pub device_name: String,
}

impl PlaybackInfo {
    pub fn idle(default_album_art: &str) -> Self {
        Self {
            track: TrackInfo::idle(default_album_art),
            progress_ms: 0,
            duration_ms: 0,
            is_playing: false,
            volume: 0,
            device_name: String::new(),
        }
    }

    pub fn remaining_ms(&self) -> u32 {
        self.duration_ms.saturating_sub(self.progress_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_track_means_no_state() {
        let timing = PlaybackTiming::default();
        assert!(timing.to_state().is_none());
    }

    #[test]
    fn paused_position_does_not_move() {
        let mut timing = PlaybackTiming::default();
        timing.load_track(TrackRef::from_uri("spotify:track:a"), 10_000);
        timing.update_position(1_500, false);

        let state = timing.to_state().unwrap();
        assert_eq!(state.position_ms, 1_500);
        assert!(state.paused);
        assert_eq!(state.duration_ms, 10_000);
    }

    #[test]
    fn playing_position_is_capped_at_duration() {
        let mut timing = PlaybackTiming::default();
        timing.load_track(TrackRef::from_uri("spotify:track:a"), 1_000);
        timing.update_position(5_000, true);
        assert_eq!(timing.current_position_ms(), 1_000);
    }
}
