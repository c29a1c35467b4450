//! Footer: playing track and its progress

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::PlaybackInfo;
use super::utils::{format_duration, progress_ratio};

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let status_text = if playback.track.is_idle() {
        format!(" {}", playback.track.name)
    } else {
        let indicator = if playback.is_playing { " ▶" } else { "⏸ " };
        let album = if playback.track.album.is_empty() {
            String::new()
        } else {
            format!(" ({})", playback.track.album)
        };
        format!(
            "{} {} | {}{}",
            indicator, playback.track.name, playback.track.artist, album
        )
    };

    let time_str = format!(
        "{} / -{}",
        format_duration(playback.progress_ms),
        format_duration(playback.remaining_ms())
    );

    let controls_info = format!(" Vol: {}% | H for help ", playback.volume);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio(playback.progress_ms, playback.duration_ms))
        .label(time_str);

    frame.render_widget(gauge, area);
}
