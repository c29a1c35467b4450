//! Overlay rendering (alert notification, help popup)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::UiState;

const KEYBINDINGS: &[(&str, &str)] = &[
    ("", "── Navigation ──"),
    ("Tab / Shift+Tab", "Next / previous tab"),
    ("1 - 4", "Queue, Search, Liked, Recent"),
    ("↑ / ↓", "Move selection"),
    ("/ or G", "Focus search"),
    ("Enter", "Play selected track"),
    ("", ""),
    ("", "── Playback ──"),
    ("Space", "Play / Pause"),
    ("N", "Next in queue"),
    ("P", "Previous in queue"),
    ("← / →", "Seek -10s / +10s"),
    ("0", "Restart track"),
    ("+ / -", "Volume up / down"),
    ("M", "Mute"),
    ("", ""),
    ("", "── Actions ──"),
    ("X", "Like / Unlike track"),
    ("K", "Add to queue"),
    ("Delete", "Remove from queue"),
    ("", ""),
    ("", "── General ──"),
    ("H", "Toggle this help"),
    ("Q", "Quit"),
];

/// Rect of the given size centred in `area`, cleared for drawing on top.
fn popup_area(frame: &mut Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let width = width.min(area.width);
    let height = height.min(area.height.saturating_sub(4));
    let popup = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);
    popup
}

fn popup_block(title: &'static str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

pub fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
    let Some(message) = ui_state.error_message.as_deref() else {
        return;
    };

    let width = 52.min(frame.area().width.saturating_sub(4));
    let inner_width = width.saturating_sub(4).max(1) as usize;
    let line_count = message.chars().count().div_ceil(inner_width).max(1) as u16;

    let area = popup_area(frame, width, line_count + 2);
    let alert = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(popup_block(" Alert (Esc to dismiss) ", Color::Red));

    frame.render_widget(alert, area);
}

pub fn render_help_popup(frame: &mut Frame) {
    let area = popup_area(frame, 62, KEYBINDINGS.len() as u16 + 2);

    let lines: Vec<Line> = KEYBINDINGS
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help = Paragraph::new(lines)
        .block(popup_block(" Help (H or Esc to close) ", Color::Cyan))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help, area);
}
