//! Playback control commands and the UI update listener

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use super::{AppController, Command, UiUpdate};

const VOLUME_STEP: i16 = 5;
const SEEK_STEP_MS: i64 = 10_000;

impl AppController {
    pub fn toggle_playback(&self) {
        self.send(Command::TogglePlay);
    }

    pub fn next_track(&self) {
        self.send(Command::Next);
    }

    pub fn previous_track(&self) {
        self.send(Command::Previous);
    }

    pub fn volume_up(&self) {
        self.send(Command::ChangeVolume { delta: VOLUME_STEP });
    }

    pub fn volume_down(&self) {
        self.send(Command::ChangeVolume { delta: -VOLUME_STEP });
    }

    pub fn seek_forward(&self) {
        self.send(Command::SeekBy { offset_ms: SEEK_STEP_MS });
    }

    pub fn seek_backward(&self) {
        self.send(Command::SeekBy { offset_ms: -SEEK_STEP_MS });
    }

    pub fn restart_track(&self) {
        self.send(Command::Seek { position_ms: 0 });
    }

    pub fn mute(&self) {
        self.send(Command::SetVolume { percent: 0 });
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Fold reconciler output into the model until the channel closes.
    pub fn start_ui_update_listener(&self, mut updates: UnboundedReceiver<UiUpdate>) -> JoinHandle<()> {
        let model = self.model.clone();
        tracing::info!("Starting UI update listener");

        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                tracing::trace!(update = ?update, "UI update");
                model.lock().await.apply_ui_update(update).await;
            }
            tracing::debug!("UI update listener stopped");
        })
    }
}
