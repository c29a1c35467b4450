//! Shared rendering helpers

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

const COLUMN_GAP: &str = "   ";
const LIKED_WIDTH: usize = 2;
const DURATION_WIDTH: usize = 8;
/// Share of the flexible width given to the title column, in percent
const TITLE_SHARE: usize = 55;

/// List that keeps `selected` scrolled into view. Row styling is left to the
/// items themselves.
pub fn render_scrollable_list(frame: &mut Frame, area: Rect, items: Vec<ListItem>, selected: usize, block: Block) {
    let mut state = ListState::default().with_selected(Some(selected));
    let list = List::new(items).block(block).highlight_style(Style::default());
    frame.render_stateful_widget(list, area, &mut state);
}

/// `m:ss`
pub fn format_duration(ms: u32) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn progress_ratio(position_ms: u32, duration_ms: u32) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    (position_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Pad or cut `s` to exactly `width` characters, marking cuts with "...".
pub fn fit_to_width(s: &str, width: usize) -> String {
    let fitted: String = if s.chars().count() > width {
        let mut cut: String = s.chars().take(width.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    } else {
        s.to_string()
    };
    format!("{:<width$}", fitted, width = width)
}

/// Column layout of a track listing row:
/// `{marker}{num}   {liked}   {title}   {artists}   {duration}`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackColumns {
    pub num: usize,
    pub title: usize,
    pub artists: usize,
}

impl TrackColumns {
    pub fn new(content_width: usize, item_count: usize) -> Self {
        // Index digits plus one column of padding
        let num = item_count.max(1).to_string().len() + 1;
        let fixed = 1 + num + LIKED_WIDTH + DURATION_WIDTH + 4 * COLUMN_GAP.len();
        let flexible = content_width.saturating_sub(fixed);
        let title = flexible * TITLE_SHARE / 100;
        Self {
            num,
            title,
            artists: flexible - title,
        }
    }

    pub fn row(&self, marker: &str, num: &str, liked: &str, title: &str, artists: &str, duration: &str) -> String {
        [
            format!("{}{:<width$}", marker, num, width = self.num),
            liked.to_string(),
            fit_to_width(title, self.title),
            fit_to_width(artists, self.artists),
            duration.to_string(),
        ]
        .join(COLUMN_GAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(61_999), "1:01");
        assert_eq!(format_duration(3_600_000), "60:00");
    }

    #[test]
    fn long_strings_are_cut_to_width() {
        assert_eq!(fit_to_width("abcdefgh", 6), "abc...");
        assert_eq!(fit_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn index_column_grows_with_count() {
        assert_eq!(TrackColumns::new(100, 0).num, 2);
        assert_eq!(TrackColumns::new(100, 9).num, 2);
        assert_eq!(TrackColumns::new(100, 120).num, 4);
    }

    #[test]
    fn flexible_width_is_split_between_title_and_artists() {
        let columns = TrackColumns::new(126, 9);
        // 126 - (1 + 2 + 2 + 8 + 12) = 101
        assert_eq!(columns.title + columns.artists, 101);
        assert_eq!(columns.title, 55);
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(progress_ratio(5, 0), 0.0);
        assert_eq!(progress_ratio(50, 100), 0.5);
        assert_eq!(progress_ratio(150, 100), 1.0);
    }
}
