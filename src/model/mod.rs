//! Model module - Application state and data types
//!
//! - `track`: Track references and display metadata
//! - `queue`: Session play queue with its cursor
//! - `playback`: Player state, local timing and the footer view of it
//! - `snapshot`: Persisted playback snapshot and its stores
//! - `types`: UI enums and state
//! - `content`: Track listings per tab
//! - `cache`: Liked songs cache for fast lookup
//! - `spotify_client`: Spotify Web API client wrapper
//! - `app_model`: Main application model with state management methods

mod track;
mod queue;
mod playback;
pub mod snapshot;
mod types;
mod content;
mod cache;
mod spotify_client;
mod app_model;

pub use track::{parse_track_uri, TrackInfo, TrackRef};
pub use queue::QueueCursor;
pub use playback::{PlaybackInfo, PlaybackTiming, PlayerState};
pub use types::{ActiveSection, ContentTab, UiState};
pub use content::ContentState;
pub use spotify_client::SpotifyClient;
pub use app_model::AppModel;
