//! View module - UI rendering
//!
//! - `utils`: Shared helpers (formatting, scrollable lists)
//! - `layout`: Top bar and tab strip
//! - `content`: Track listing of the active tab
//! - `progress`: Footer with the playing track and its progress
//! - `overlays`: Alert and help popups

mod utils;
mod layout;
mod content;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{ContentState, PlaybackInfo, UiState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, playback: &PlaybackInfo, ui_state: &UiState, content_state: &ContentState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar + device
                Constraint::Length(1), // Tabs
                Constraint::Min(0),    // Track listing
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], ui_state, &playback.device_name);
        layout::render_tabs(frame, chunks[1], content_state.tab);

        let current_playing_uri = (!playback.track.is_idle()).then_some(playback.track.uri.as_str());
        content::render_main_content(frame, chunks[2], ui_state, content_state, current_playing_uri);

        progress::render_progress_bar(frame, chunks[3], playback);

        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
