//! Local playback device built on librespot
//!
//! Registers this process as a Spotify Connect device and exposes its player
//! to the reconciler through [`PlayerSdk`].

use std::sync::{Arc, Mutex};

use anyhow::Result;
use librespot::connect::{ConnectConfig, Spirc};
use librespot::core::config::SessionConfig;
use librespot::core::session::Session;
use librespot::playback::config::{AudioFormat, Bitrate, PlayerConfig};
use librespot::playback::mixer::MixerConfig;
use librespot::playback::player::{Player, PlayerEventChannel};
use librespot::playback::{audio_backend, mixer};

use crate::auth::AuthResult;
use crate::controller::PlayerSdk;
use crate::model::{PlaybackTiming, PlayerState};

pub struct AudioBackend {
    player: Arc<Player>,
    session: Session,
    spirc: Spirc,
    timing: Arc<Mutex<PlaybackTiming>>,
    device_name: String,
}

impl AudioBackend {
    pub async fn new(auth: &AuthResult, device_name: &str) -> Result<Self> {
        tracing::info!(device_name, "Connecting librespot session");

        let session_config = SessionConfig {
            device_id: Self::device_id(device_name),
            ..Default::default()
        };
        let player_config = PlayerConfig {
            bitrate: Bitrate::Bitrate320,
            ..Default::default()
        };
        let connect_config = ConnectConfig {
            name: device_name.to_string(),
            ..Default::default()
        };
        let audio_format = AudioFormat::default();

        let sink_builder = audio_backend::find(None)
            .ok_or_else(|| anyhow::anyhow!("No audio backend available"))?;
        let mixer_builder = mixer::find(None)
            .ok_or_else(|| anyhow::anyhow!("No audio mixer available"))?;
        let mixer = mixer_builder(MixerConfig::default())?;

        let session = Session::new(session_config, Some(auth.cache.clone()));

        let player = Player::new(
            player_config,
            session.clone(),
            mixer.get_soft_volume(),
            move || sink_builder(None, audio_format),
        );

        let (spirc, spirc_task) = Spirc::new(
            connect_config,
            session.clone(),
            auth.librespot_credentials.clone(),
            player.clone(),
            mixer,
        )
        .await?;

        spirc.activate()?;

        tokio::spawn(async move {
            let _ = spirc_task.await;
            tracing::debug!("Spirc task finished");
        });

        tracing::info!(device_name, "Audio player initialized");

        Ok(Self {
            player,
            session,
            spirc,
            timing: Arc::new(Mutex::new(PlaybackTiming::default())),
            device_name: device_name.to_string(),
        })
    }

    fn device_id(device_name: &str) -> String {
        // Stable per machine so Spotify keeps recognising the device
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format!("{}-{}", device_name, hostname)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn username(&self) -> String {
        self.session.username()
    }

    pub fn get_player_event_channel(&self) -> PlayerEventChannel {
        self.player.get_player_event_channel()
    }

    /// Position bookkeeping shared with the player event bridge
    pub fn timing(&self) -> Arc<Mutex<PlaybackTiming>> {
        self.timing.clone()
    }

    pub fn shutdown(&self) {
        if let Err(e) = self.spirc.shutdown() {
            tracing::warn!(error = %e, "Failed to shut down spirc");
        }
    }
}

impl PlayerSdk for AudioBackend {
    fn current_state(&self) -> Option<PlayerState> {
        match self.timing.lock() {
            Ok(timing) => timing.to_state(),
            Err(_) => None,
        }
    }

    fn toggle_play(&self) -> Result<()> {
        self.spirc.play_pause()?;
        Ok(())
    }

    fn seek(&self, position_ms: u32) -> Result<()> {
        self.spirc.set_position_ms(position_ms)?;
        Ok(())
    }

    fn set_volume(&self, percent: u8) -> Result<()> {
        self.spirc.set_volume(percent_to_volume(percent))?;
        Ok(())
    }
}

/// librespot volumes span the full `u16` range
fn percent_to_volume(percent: u8) -> u16 {
    (u32::from(percent.min(100)) * u32::from(u16::MAX) / 100) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_scale_covers_u16() {
        assert_eq!(percent_to_volume(0), 0);
        assert_eq!(percent_to_volume(100), u16::MAX);
        assert_eq!(percent_to_volume(250), u16::MAX);
        assert_eq!(percent_to_volume(50), 32767);
    }
}
