//! Layout rendering (top bar, tab strip)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Padding, Paragraph, Tabs},
    Frame,
};

use crate::model::{ActiveSection, ContentTab, UiState};

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState, device_name: &str) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Search input
            Constraint::Length(25), // Device name
        ])
        .split(area);

    let focused = ui_state.active_section == ActiveSection::Search;
    let search_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    let search_text = if ui_state.search_query.is_empty() && !focused {
        "Press / to search..."
    } else {
        &ui_state.search_query
    };

    let search = Paragraph::new(search_text)
        .style(search_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search ")
                .padding(Padding::horizontal(1))
                .border_style(if focused {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                }),
        );
    frame.render_widget(search, chunks[0]);

    let device = Paragraph::new(format!("🎵 {}", device_name))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Device "));
    frame.render_widget(device, chunks[1]);
}

pub fn render_tabs(frame: &mut Frame, area: Rect, active: ContentTab) {
    let titles: Vec<Line> = ContentTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!(" {} {} ", i + 1, tab.title())))
        .collect();

    let selected = ContentTab::ALL.iter().position(|tab| *tab == active).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, area);
}
