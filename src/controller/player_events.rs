//! Bridge from librespot player events to session events
//!
//! Keeps the shared [`PlaybackTiming`] current and republishes what the
//! reconciler cares about as [`SdkEvent`]s, stamped when they were observed.

use std::sync::{Arc, Mutex};

use librespot::metadata::audio::{AudioItem, UniqueFields};
use librespot::playback::player::{PlayerEvent, PlayerEventChannel};
use tokio::task::JoinHandle;

use crate::model::{parse_track_uri, PlaybackTiming, TrackRef};

use super::events::{EventPublisher, SdkEvent, SessionEvent};

/// Player event reduced to what the timing needs
#[derive(Clone, Debug, PartialEq)]
enum PlayerChange {
    TrackLoaded { track: TrackRef, duration_ms: u32 },
    Position { position_ms: u32, playing: Option<bool> },
    Stopped,
    Ended,
    Unavailable,
}

pub fn start_player_event_bridge(
    mut event_channel: PlayerEventChannel,
    timing: Arc<Mutex<PlaybackTiming>>,
    publisher: EventPublisher,
) -> JoinHandle<()> {
    tracing::info!("Starting librespot player event bridge");

    tokio::spawn(async move {
        while let Some(event) = event_channel.recv().await {
            let seq = publisher.stamp();
            let Some(change) = classify(event) else {
                continue;
            };

            let outgoing = match timing.lock() {
                Ok(mut timing) => apply_change(&mut timing, change),
                Err(_) => {
                    tracing::error!("Playback timing lock poisoned, stopping bridge");
                    break;
                }
            };

            if let Some(sdk_event) = outgoing {
                if !publisher.send_stamped(seq, SessionEvent::Sdk(sdk_event)) {
                    break;
                }
            }
        }
        tracing::debug!("Player event bridge stopped");
    })
}

fn classify(event: PlayerEvent) -> Option<PlayerChange> {
    match event {
        PlayerEvent::TrackChanged { audio_item } => {
            let track = track_from_audio_item(&audio_item);
            tracing::info!(
                track = %audio_item.name,
                uri = %track.uri,
                duration_ms = audio_item.duration_ms,
                "PlayerEvent::TrackChanged"
            );
            Some(PlayerChange::TrackLoaded {
                track,
                duration_ms: audio_item.duration_ms,
            })
        }
        PlayerEvent::Playing { position_ms, .. } => {
            tracing::trace!(position_ms, "PlayerEvent::Playing");
            Some(PlayerChange::Position { position_ms, playing: Some(true) })
        }
        PlayerEvent::Paused { position_ms, .. } => {
            tracing::debug!(position_ms, "PlayerEvent::Paused");
            Some(PlayerChange::Position { position_ms, playing: Some(false) })
        }
        PlayerEvent::Seeked { position_ms, .. } => {
            tracing::debug!(position_ms, "PlayerEvent::Seeked");
            Some(PlayerChange::Position { position_ms, playing: None })
        }
        PlayerEvent::PositionChanged { position_ms, .. } => {
            tracing::trace!(position_ms, "PlayerEvent::PositionChanged");
            Some(PlayerChange::Position { position_ms, playing: None })
        }
        PlayerEvent::Stopped { .. } => {
            tracing::debug!("PlayerEvent::Stopped");
            Some(PlayerChange::Stopped)
        }
        PlayerEvent::EndOfTrack { .. } => {
            tracing::debug!("PlayerEvent::EndOfTrack");
            Some(PlayerChange::Ended)
        }
        PlayerEvent::Unavailable { .. } => {
            tracing::warn!("PlayerEvent::Unavailable");
            Some(PlayerChange::Unavailable)
        }
        PlayerEvent::Loading { position_ms, .. } => {
            tracing::debug!(position_ms, "PlayerEvent::Loading");
            None
        }
        _ => {
            tracing::trace!("PlayerEvent: other event received");
            None
        }
    }
}

fn apply_change(timing: &mut PlaybackTiming, change: PlayerChange) -> Option<SdkEvent> {
    match change {
        PlayerChange::TrackLoaded { track, duration_ms } => {
            timing.load_track(track, duration_ms);
            None
        }
        PlayerChange::Position { position_ms, playing } => {
            let is_playing = playing.unwrap_or(timing.is_playing);
            timing.update_position(position_ms, is_playing);
            Some(SdkEvent::StateChanged(timing.to_state()))
        }
        PlayerChange::Stopped => {
            timing.clear();
            Some(SdkEvent::StateChanged(None))
        }
        PlayerChange::Ended => {
            let uri = timing.track.as_ref()?.uri.clone();
            timing.update_position(timing.duration_ms, false);
            Some(SdkEvent::TrackEnded { uri })
        }
        PlayerChange::Unavailable => {
            let uri = timing
                .track
                .as_ref()
                .map(|t| t.uri.clone())
                .unwrap_or_default();
            Some(SdkEvent::Error {
                message: format!("Track unavailable: {}", uri),
            })
        }
    }
}

fn track_from_audio_item(audio_item: &AudioItem) -> TrackRef {
    let (artists, album) = match &audio_item.unique_fields {
        UniqueFields::Track { artists, album, .. } => (
            artists.0.iter().map(|a| a.name.clone()).collect(),
            Some(album.clone()),
        ),
        UniqueFields::Episode { show_name, .. } => (vec![show_name.clone()], None),
        UniqueFields::Local { artists, album, .. } => {
            (artists.clone().into_iter().collect(), album.clone())
        }
    };

    let uri = audio_item.track_id.to_uri().unwrap_or_default();
    let id = parse_track_uri(&uri).unwrap_or_default().to_string();

    TrackRef {
        id,
        uri,
        name: Some(audio_item.name.clone()),
        artists,
        album,
        album_art: audio_item.covers.first().map(|cover| cover.url.clone()),
        duration_ms: Some(audio_item.duration_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(timing: &mut PlaybackTiming, id: &str) {
        let change = PlayerChange::TrackLoaded {
            track: TrackRef::from_uri(&format!("spotify:track:{}", id)),
            duration_ms: 180_000,
        };
        assert!(apply_change(timing, change).is_none());
    }

    #[test]
    fn playing_and_paused_publish_state() {
        let mut timing = PlaybackTiming::default();
        loaded(&mut timing, "a");

        let event = apply_change(
            &mut timing,
            PlayerChange::Position { position_ms: 2_000, playing: Some(false) },
        );
        match event {
            Some(SdkEvent::StateChanged(Some(state))) => {
                assert_eq!(state.track.id, "a");
                assert_eq!(state.position_ms, 2_000);
                assert_eq!(state.duration_ms, 180_000);
                assert!(state.paused);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn seek_keeps_play_state() {
        let mut timing = PlaybackTiming::default();
        loaded(&mut timing, "a");
        apply_change(&mut timing, PlayerChange::Position { position_ms: 0, playing: Some(false) });

        apply_change(&mut timing, PlayerChange::Position { position_ms: 50_000, playing: None });
        assert!(!timing.is_playing);
        assert_eq!(timing.position_ms, 50_000);
    }

    #[test]
    fn stop_means_no_state() {
        let mut timing = PlaybackTiming::default();
        loaded(&mut timing, "a");

        let event = apply_change(&mut timing, PlayerChange::Stopped);
        assert!(matches!(event, Some(SdkEvent::StateChanged(None))));
        assert!(timing.track.is_none());
    }

    #[test]
    fn end_of_track_names_the_loaded_track() {
        let mut timing = PlaybackTiming::default();
        assert!(apply_change(&mut timing, PlayerChange::Ended).is_none());

        loaded(&mut timing, "a");
        let event = apply_change(&mut timing, PlayerChange::Ended);
        assert!(matches!(
            event,
            Some(SdkEvent::TrackEnded { ref uri }) if uri == "spotify:track:a"
        ));
    }
}
