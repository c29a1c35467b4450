//! Track listings shown in the main content area

use std::collections::HashSet;

use super::track::TrackRef;
use super::types::ContentTab;

/// A list of tracks with a selection.
#[derive(Clone, Debug, Default)]
pub struct TrackListing {
    pub tracks: Vec<TrackRef>,
    pub selected_index: usize,
}

impl TrackListing {
    pub fn set_tracks(&mut self, tracks: Vec<TrackRef>) {
        self.tracks = tracks;
        self.clamp_selection();
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected_index < self.tracks.len().saturating_sub(1) {
            self.selected_index += 1;
        }
    }

    pub fn selected(&self) -> Option<&TrackRef> {
        self.tracks.get(self.selected_index)
    }

    fn clamp_selection(&mut self) {
        self.selected_index = self.selected_index.min(self.tracks.len().saturating_sub(1));
    }
}

/// Content state: one listing per tab plus the liked-track markers.
#[derive(Clone, Debug, Default)]
pub struct ContentState {
    pub tab: ContentTab,
    pub queue: TrackListing,
    /// Cursor of the session queue, mirrored from the reconciler
    pub queue_current: Option<usize>,
    pub search: TrackListing,
    pub liked: TrackListing,
    pub recent: TrackListing,
    pub liked_ids: HashSet<String>,
    pub is_loading: bool,
}

impl ContentState {
    pub fn listing(&self, tab: ContentTab) -> &TrackListing {
        match tab {
            ContentTab::Queue => &self.queue,
            ContentTab::Search => &self.search,
            ContentTab::Liked => &self.liked,
            ContentTab::Recent => &self.recent,
        }
    }

    pub fn listing_mut(&mut self, tab: ContentTab) -> &mut TrackListing {
        match tab {
            ContentTab::Queue => &mut self.queue,
            ContentTab::Search => &mut self.search,
            ContentTab::Liked => &mut self.liked,
            ContentTab::Recent => &mut self.recent,
        }
    }

    pub fn active_listing(&self) -> &TrackListing {
        self.listing(self.tab)
    }

    pub fn is_liked(&self, track_id: &str) -> bool {
        self.liked_ids.contains(track_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(n: usize) -> TrackListing {
        let mut listing = TrackListing::default();
        listing.set_tracks(
            (0..n)
                .map(|i| TrackRef::from_uri(&format!("spotify:track:t{}", i)))
                .collect(),
        );
        listing
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut l = listing(2);
        l.move_up();
        assert_eq!(l.selected_index, 0);
        l.move_down();
        l.move_down();
        assert_eq!(l.selected_index, 1);
        assert_eq!(l.selected().map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn shrinking_listing_clamps_selection() {
        let mut l = listing(5);
        l.selected_index = 4;
        l.set_tracks(vec![TrackRef::from_uri("spotify:track:x")]);
        assert_eq!(l.selected_index, 0);

        l.set_tracks(Vec::new());
        assert!(l.selected().is_none());
    }
}
