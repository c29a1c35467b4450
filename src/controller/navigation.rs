//! Listings, search and the actions on a selected track

use crate::log_api_result;
use crate::model::ContentTab;

use super::{AppController, Command};

impl AppController {
    pub async fn perform_search(&self, query: &str) {
        tracing::info!(query, "Searching tracks");
        let model = self.model.lock().await;
        let Some(spotify) = model.get_spotify_client().await else {
            return;
        };
        model.set_active_tab(ContentTab::Search).await;
        model.set_content_loading(true).await;
        drop(model);

        let result = spotify.search_tracks(query, self.config.search_limit).await;
        log_api_result!("search", result);

        let model = self.model.lock().await;
        match result {
            Ok(tracks) => {
                tracing::debug!(count = tracks.len(), "Search results received");
                model.set_listing(ContentTab::Search, tracks).await;
            }
            Err(e) => {
                model.set_content_loading(false).await;
                model.set_error(format!("Search failed: {}", e)).await;
            }
        }
    }

    /// Load the listing behind a tab when it is opened.
    pub async fn load_tab(&self, tab: ContentTab) {
        match tab {
            ContentTab::Liked => self.load_liked_tracks().await,
            ContentTab::Recent => self.load_recently_played().await,
            ContentTab::Queue | ContentTab::Search => {}
        }
    }

    pub async fn load_liked_tracks(&self) {
        let model = self.model.lock().await;
        let Some(spotify) = model.get_spotify_client().await else {
            return;
        };
        model.set_content_loading(true).await;
        drop(model);

        let result = spotify.get_liked_tracks(self.config.liked_limit).await;
        log_api_result!("liked_tracks", result);

        let model = self.model.lock().await;
        match result {
            Ok(tracks) => {
                model.set_listing(ContentTab::Liked, tracks).await;
                model.set_liked_ids(spotify.liked_ids().await).await;
            }
            Err(e) => {
                model.set_content_loading(false).await;
                model.set_error(format!("Failed to load liked songs: {}", e)).await;
            }
        }
    }

    pub async fn load_recently_played(&self) {
        let model = self.model.lock().await;
        let Some(spotify) = model.get_spotify_client().await else {
            return;
        };
        model.set_content_loading(true).await;
        drop(model);

        let result = spotify.get_recently_played(self.config.recent_limit).await;
        log_api_result!("recently_played", result);

        let model = self.model.lock().await;
        match result {
            Ok(tracks) => model.set_listing(ContentTab::Recent, tracks).await,
            Err(e) => {
                model.set_content_loading(false).await;
                model.set_error(format!("Failed to load recently played: {}", e)).await;
            }
        }
    }

    /// Play the selected track. Outside the queue tab the listing becomes
    /// the new queue.
    pub async fn play_selected(&self) {
        let model = self.model.lock().await;
        let tab = model.active_tab().await;
        let selected = model.get_selected_listing().await;
        drop(model);

        let Some((tracks, index)) = selected else {
            return;
        };

        if tab == ContentTab::Queue {
            let uri = tracks[index].uri.clone();
            self.send(Command::PlayAt { index, uri });
        } else {
            self.send(Command::PlayFrom { tracks, index });
        }
    }

    pub async fn enqueue_selected(&self) {
        let model = self.model.lock().await;
        if model.active_tab().await == ContentTab::Queue {
            return;
        }
        let selected = model.get_selected_track().await;
        drop(model);

        if let Some(track) = selected {
            tracing::info!(uri = %track.uri, "Adding selected track to queue");
            self.send(Command::Enqueue(vec![track]));
        }
    }

    pub async fn remove_selected_from_queue(&self) {
        let model = self.model.lock().await;
        if model.active_tab().await != ContentTab::Queue {
            return;
        }
        let selected = model.get_selected_track().await;
        drop(model);

        if let Some(track) = selected {
            self.send(Command::RemoveFromQueue { id: track.id });
        }
    }

    pub async fn toggle_like_selected(&self) {
        let model = self.model.lock().await;
        let selected = model.get_selected_track().await;
        let spotify = model.get_spotify_client().await;
        drop(model);

        let (Some(track), Some(spotify)) = (selected, spotify) else {
            return;
        };
        if track.id.is_empty() {
            tracing::warn!("Cannot toggle liked status: track ID is empty");
            self.model
                .lock()
                .await
                .set_error("Cannot like/unlike: track has no ID".to_string())
                .await;
            return;
        }

        let result = spotify.toggle_liked_song(&track.id).await;
        log_api_result!("toggle_liked", result);

        let model = self.model.lock().await;
        match result {
            Ok(liked) => {
                tracing::info!(track_id = %track.id, liked, "Track liked status toggled");
                model.update_track_liked_status(&track.id, liked).await;
            }
            Err(e) => model.set_error(format!("Failed to update liked songs: {}", e)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use crate::config::Config;
    use crate::controller::events::{EventPublisher, SessionEvent};
    use crate::model::{AppModel, TrackRef};

    use super::*;

    fn tracks() -> Vec<TrackRef> {
        ["a", "b", "c"]
            .iter()
            .map(|id| TrackRef::from_uri(&format!("spotify:track:{}", id)))
            .collect()
    }

    async fn controller() -> (AppController, tokio::sync::mpsc::UnboundedReceiver<crate::controller::events::Envelope>) {
        let (publisher, rx) = EventPublisher::channel();
        let model = AppModel::new("/art.jpg");
        model.set_listing(ContentTab::Search, tracks()).await;
        model.set_active_tab(ContentTab::Search).await;
        model.content_move_down().await;
        let controller = AppController::new(Arc::new(Mutex::new(model)), publisher, Arc::new(Config::default()));
        (controller, rx)
    }

    #[tokio::test]
    async fn playing_from_a_listing_replaces_the_queue() {
        let (controller, mut rx) = controller().await;
        controller.play_selected().await;

        match rx.recv().await.unwrap().event {
            SessionEvent::Command(Command::PlayFrom { tracks, index }) => {
                assert_eq!(tracks.len(), 3);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn playing_from_the_queue_keeps_it() {
        let (controller, mut rx) = controller().await;
        {
            let model = controller.model.lock().await;
            model.set_listing(ContentTab::Queue, tracks()).await;
            model.set_active_tab(ContentTab::Queue).await;
        }
        controller.play_selected().await;

        assert!(matches!(
            rx.recv().await.unwrap().event,
            SessionEvent::Command(Command::PlayAt { index: 0, ref uri }) if uri == "spotify:track:a"
        ));
    }

    #[tokio::test]
    async fn playing_a_repeated_queue_entry_sends_its_index() {
        let (controller, mut rx) = controller().await;
        {
            let model = controller.model.lock().await;
            let mut queue = tracks();
            queue.push(queue[0].clone());
            model.set_listing(ContentTab::Queue, queue).await;
            model.set_active_tab(ContentTab::Queue).await;
            for _ in 0..3 {
                model.content_move_down().await;
            }
        }
        controller.play_selected().await;

        assert!(matches!(
            rx.recv().await.unwrap().event,
            SessionEvent::Command(Command::PlayAt { index: 3, ref uri }) if uri == "spotify:track:a"
        ));
    }

    #[tokio::test]
    async fn queue_actions_depend_on_tab() {
        let (controller, mut rx) = controller().await;

        controller.remove_selected_from_queue().await;
        controller.enqueue_selected().await;

        match rx.recv().await.unwrap().event {
            SessionEvent::Command(Command::Enqueue(added)) => {
                assert_eq!(added.len(), 1);
                assert_eq!(added[0].id, "b");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }
}
