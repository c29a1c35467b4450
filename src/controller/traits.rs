//! Seams between the reconciler and the outside world

use std::future::Future;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::model::{PlayerState, TrackInfo, TrackRef};

/// Backend that starts playback on the user's behalf.
pub trait PlaybackBackend: Send + Sync {
    fn play(&self, track_id: &str, position_ms: u32) -> impl Future<Output = Result<()>> + Send;

    /// Move playback to the named device.
    fn transfer_playback(&self, device_name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Read access and transport controls of the playback SDK.
pub trait PlayerSdk: Send + Sync {
    fn current_state(&self) -> Option<PlayerState>;
    fn toggle_play(&self) -> Result<()>;
    fn seek(&self, position_ms: u32) -> Result<()>;
    fn set_volume(&self, percent: u8) -> Result<()>;
}

/// Display-ready updates for the UI layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiUpdate {
    /// Nothing playing: indicator off, progress zeroed, footer cleared
    Idle,
    Track(TrackInfo),
    PlayPause { is_playing: bool },
    Progress { position_ms: u32, duration_ms: u32 },
    Queue { tracks: Vec<TrackRef>, current: Option<usize> },
    Volume(u8),
    Alert(String),
}

pub trait UiSink: Send + Sync {
    fn apply(&self, update: UiUpdate);
}

impl UiSink for UnboundedSender<UiUpdate> {
    fn apply(&self, update: UiUpdate) {
        if self.send(update).is_err() {
            tracing::trace!("UI channel closed");
        }
    }
}
