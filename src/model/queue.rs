//! Session play queue with a single "currently selected" cursor

use super::track::TrackRef;

/// Ordered list of tracks plus the index of the selected one.
///
/// The selection is independent of whether that track is actually playing.
/// `current` is `None` exactly when nothing is selected, and is always a
/// valid index otherwise.
#[derive(Clone, Debug, Default)]
pub struct QueueCursor {
    items: Vec<TrackRef>,
    current: Option<usize>,
}

impl QueueCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue; selects the first entry if there is one.
    pub fn set_queue(&mut self, items: Vec<TrackRef>) {
        self.current = if items.is_empty() { None } else { Some(0) };
        self.items = items;
    }

    pub fn queue(&self) -> &[TrackRef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_item(&self) -> Option<&TrackRef> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Move to the next entry. Stops at the end instead of wrapping.
    pub fn advance(&mut self) -> Option<&TrackRef> {
        let idx = self.current?;
        if idx + 1 < self.items.len() {
            self.current = Some(idx + 1);
            return self.items.get(idx + 1);
        }
        None
    }

    /// Move to the previous entry. Stops at the start.
    pub fn retreat(&mut self) -> Option<&TrackRef> {
        let idx = self.current?;
        if idx > 0 {
            self.current = Some(idx - 1);
            return self.items.get(idx - 1);
        }
        None
    }

    /// Point the cursor at `index`. Out-of-range indices are rejected, not
    /// clamped, so the cursor never silently lands on the wrong track.
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Add entries at the end. The cursor only moves if the queue was empty.
    pub fn append(&mut self, items: Vec<TrackRef>) {
        self.items.extend(items);
        if self.current.is_none() && !self.items.is_empty() {
            self.current = Some(0);
        }
    }

    /// Remove every entry with the given track id. Returns how many were removed.
    pub fn remove_by_id(&mut self, id: &str) -> usize {
        let before = self.items.len();
        let current = self.current;
        let mut removed_before_cursor = 0;
        let mut current_removed = false;
        let mut index = 0;

        self.items.retain(|track| {
            let keep = track.id != id;
            if !keep {
                match current {
                    Some(cur) if index < cur => removed_before_cursor += 1,
                    Some(cur) if index == cur => current_removed = true,
                    _ => {}
                }
            }
            index += 1;
            keep
        });

        let removed = before - self.items.len();
        if removed == 0 {
            return 0;
        }

        self.current = match current {
            _ if self.items.is_empty() => None,
            Some(cur) => {
                let shifted = cur - removed_before_cursor;
                if current_removed {
                    Some(shifted.min(self.items.len() - 1))
                } else {
                    Some(shifted)
                }
            }
            None => Some(0),
        };
        removed
    }

    /// Index of the first entry with the given URI.
    pub fn position_of_uri(&self, uri: &str) -> Option<usize> {
        self.items.iter().position(|t| t.uri == uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(ids: &[&str]) -> Vec<TrackRef> {
        ids.iter()
            .map(|id| TrackRef::from_uri(&format!("spotify:track:{}", id)))
            .collect()
    }

    fn current_id(queue: &QueueCursor) -> Option<&str> {
        queue.current_item().map(|t| t.id.as_str())
    }

    #[test]
    fn set_queue_selects_first_entry() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b"]));
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(current_id(&queue), Some("a"));

        queue.advance();
        queue.set_queue(tracks(&["c"]));
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn empty_queue_has_no_selection() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a"]));
        queue.set_queue(Vec::new());
        assert_eq!(queue.current_index(), None);
        assert!(queue.current_item().is_none());
        assert!(queue.advance().is_none());
        assert!(queue.retreat().is_none());
    }

    #[test]
    fn advance_stops_at_last_entry() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "c"]));

        assert_eq!(queue.advance().map(|t| t.id.clone()), Some("b".to_string()));
        assert_eq!(queue.advance().map(|t| t.id.clone()), Some("c".to_string()));
        assert!(queue.advance().is_none());
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn advance_reaches_end_in_len_minus_one_steps() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "c", "d", "e"]));
        for _ in 0..4 {
            assert!(queue.advance().is_some());
        }
        assert_eq!(queue.current_index(), Some(4));
        assert!(queue.advance().is_none());
        assert_eq!(queue.current_index(), Some(4));
    }

    #[test]
    fn retreat_stops_at_first_entry() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b"]));
        assert!(queue.retreat().is_none());
        assert_eq!(queue.current_index(), Some(0));

        queue.advance();
        assert_eq!(queue.retreat().map(|t| t.id.clone()), Some("a".to_string()));
    }

    #[test]
    fn set_current_index_rejects_out_of_range() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "c"]));
        queue.advance();

        assert!(!queue.set_current_index(3));
        assert!(!queue.set_current_index(usize::MAX));
        assert_eq!(queue.current_index(), Some(1));

        assert!(queue.set_current_index(2));
        assert_eq!(current_id(&queue), Some("c"));
    }

    #[test]
    fn append_keeps_cursor() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b"]));
        queue.advance();
        queue.append(tracks(&["c", "a"]));

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn append_to_empty_queue_selects_first() {
        let mut queue = QueueCursor::new();
        queue.append(tracks(&["a"]));
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn remove_before_cursor_keeps_selected_track() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "c"]));
        queue.set_current_index(2);

        assert_eq!(queue.remove_by_id("a"), 1);
        assert_eq!(current_id(&queue), Some("c"));
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn remove_current_entry_clamps() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "c"]));
        queue.set_current_index(2);

        queue.remove_by_id("c");
        assert_eq!(queue.current_index(), Some(1));

        queue.set_current_index(0);
        queue.remove_by_id("a");
        assert_eq!(current_id(&queue), Some("b"));

        queue.remove_by_id("b");
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn remove_duplicates_and_unknown_ids() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "a", "c"]));
        queue.set_current_index(3);

        assert_eq!(queue.remove_by_id("zzz"), 0);
        assert_eq!(queue.remove_by_id("a"), 2);
        assert_eq!(current_id(&queue), Some("c"));
    }

    #[test]
    fn finds_first_position_of_uri() {
        let mut queue = QueueCursor::new();
        queue.set_queue(tracks(&["a", "b", "b"]));
        assert_eq!(queue.position_of_uri("spotify:track:b"), Some(1));
        assert_eq!(queue.position_of_uri("spotify:track:x"), None);
    }
}
