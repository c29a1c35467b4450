//! Controller module - Application logic and event handling
//!
//! - `events`: Sequenced session channel between producers and the reconciler
//! - `traits`: Seams to the backend API, the playback SDK and the UI
//! - `progress`: Progress poll while a track plays
//! - `reconciler`: Single owner of the queue and playback snapshot
//! - `player_events`: Librespot player event bridge
//! - `input`: Key event handling
//! - `playback`: Transport commands and the UI update listener
//! - `navigation`: Listings, search and like/queue actions

mod events;
mod traits;
mod progress;
mod reconciler;
mod player_events;
mod input;
mod playback;
mod navigation;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::model::AppModel;

pub use events::{Command, EventPublisher, SdkEvent};
pub use player_events::start_player_event_bridge;
pub use reconciler::Reconciler;
pub use traits::{PlaybackBackend, PlayerSdk, UiUpdate};

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) publisher: EventPublisher,
    pub(crate) config: Arc<Config>,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>, publisher: EventPublisher, config: Arc<Config>) -> Self {
        Self {
            model,
            publisher,
            config,
        }
    }

    pub(crate) fn send(&self, command: Command) {
        tracing::debug!(command = ?command, "Sending command");
        if !self.publisher.command(command) {
            tracing::warn!("Reconciler is gone, command dropped");
        }
    }
}
