//! Main content area: the track listing of the active tab

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
    Frame,
};

use crate::model::{ActiveSection, ContentState, ContentTab, TrackRef, UiState};
use super::utils::{format_duration, render_scrollable_list, TrackColumns};

pub fn render_main_content(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    content_state: &ContentState,
    current_playing_uri: Option<&str>,
) {
    let is_focused = ui_state.active_section == ActiveSection::MainContent;
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let title = format!(" {} ", content_state.tab.title());

    if content_state.is_loading {
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border_style),
            );
        frame.render_widget(loading, area);
        return;
    }

    let listing = content_state.active_listing();
    if listing.tracks.is_empty() {
        let hint = match content_state.tab {
            ContentTab::Queue => "Queue is empty\n\nPick a track in Search, Liked or Recent and press Enter to play, or K to add it here",
            ContentTab::Search => "Press / to type a query and Enter to search",
            ContentTab::Liked => "No liked songs",
            ContentTab::Recent => "Nothing played recently",
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .padding(Padding::horizontal(1))
                    .border_style(border_style),
            );
        frame.render_widget(empty, area);
        return;
    }

    // The queue marks its cursor; other listings mark the playing track
    let marked_index = match content_state.tab {
        ContentTab::Queue => content_state.queue_current,
        _ => None,
    };

    let content_width = area.width.saturating_sub(4) as usize;
    let items = render_track_items(
        &listing.tracks,
        listing.selected_index,
        is_focused,
        marked_index,
        current_playing_uri,
        content_state,
        content_width,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    render_scrollable_list(frame, area, items, listing.selected_index + 1, block);
}

fn render_track_items(
    tracks: &[TrackRef],
    selected_index: usize,
    is_focused: bool,
    marked_index: Option<usize>,
    current_playing_uri: Option<&str>,
    content_state: &ContentState,
    content_width: usize,
) -> Vec<ListItem<'static>> {
    let columns = TrackColumns::new(content_width, tracks.len());

    let header = ListItem::new(columns.row(" ", "#", "  ", "Title", "Artist", "Duration"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows = tracks.iter().enumerate().map(|(i, track)| {
        let is_marked = match marked_index {
            Some(marked) => marked == i,
            None => current_playing_uri == Some(track.uri.as_str()),
        };
        let style = match (i == selected_index, is_focused, is_marked) {
            (true, true, _) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            (_, _, true) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            (true, false, false) => Style::default().add_modifier(Modifier::BOLD),
            _ => Style::default(),
        };

        let line = columns.row(
            if is_marked { "▶" } else { " " },
            &(i + 1).to_string(),
            if content_state.is_liked(&track.id) { "💚" } else { "  " },
            track.display_name(),
            &track.artists_joined(),
            &track.duration_ms.map(format_duration).unwrap_or_default(),
        );
        ListItem::new(line).style(style)
    });

    std::iter::once(header).chain(rows).collect()
}
