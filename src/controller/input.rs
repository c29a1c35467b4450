//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{ActiveSection, ContentTab};
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Alert overlay blocks all other interactions
        if model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                model.clear_error().await;
            }
            return Ok(());
        }

        if model.is_help_popup_open().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                model.hide_help_popup().await;
            }
            return Ok(());
        }

        let ui_state = model.get_ui_state().await;

        if ui_state.active_section == ActiveSection::Search {
            match key.code {
                KeyCode::Tab | KeyCode::BackTab => {
                    model.toggle_section().await;
                }
                KeyCode::Enter => {
                    let query = ui_state.search_query.trim().to_string();
                    model.set_active_section(ActiveSection::MainContent).await;
                    drop(model);
                    if !query.is_empty() {
                        self.perform_search(&query).await;
                    }
                }
                KeyCode::Esc => {
                    model.update_search_query(String::new()).await;
                    model.set_active_section(ActiveSection::MainContent).await;
                }
                KeyCode::Backspace => {
                    model.backspace_search().await;
                }
                KeyCode::Char(c) => {
                    if (c == 'q' || c == 'Q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        model.set_should_quit(true).await;
                    } else {
                        model.append_to_search(c).await;
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Char('/') | KeyCode::Char('g') | KeyCode::Char('G') => {
                model.set_active_section(ActiveSection::Search).await;
            }
            KeyCode::Tab => {
                let tab = model.next_tab().await;
                drop(model);
                self.spawn_tab_load(tab);
            }
            KeyCode::BackTab => {
                let tab = model.prev_tab().await;
                drop(model);
                self.spawn_tab_load(tab);
            }
            KeyCode::Char(c @ '1'..='4') => {
                let tab = ContentTab::ALL[c as usize - '1' as usize];
                model.set_active_tab(tab).await;
                drop(model);
                self.spawn_tab_load(tab);
            }
            KeyCode::Up => {
                model.content_move_up().await;
            }
            KeyCode::Down => {
                model.content_move_down().await;
            }
            KeyCode::Enter => {
                drop(model);
                self.play_selected().await;
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                drop(model);
                self.toggle_like_selected().await;
            }
            KeyCode::Char('k') | KeyCode::Char('K') => {
                drop(model);
                self.enqueue_selected().await;
            }
            KeyCode::Delete => {
                drop(model);
                self.remove_selected_from_queue().await;
            }
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Char('n') | KeyCode::Char('N') => self.next_track(),
            KeyCode::Char('p') | KeyCode::Char('P') => self.previous_track(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.volume_up(),
            KeyCode::Char('-') => self.volume_down(),
            KeyCode::Char('0') => self.restart_track(),
            KeyCode::Char('m') | KeyCode::Char('M') => self.mute(),
            KeyCode::Right => self.seek_forward(),
            KeyCode::Left => self.seek_backward(),
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }

    fn spawn_tab_load(&self, tab: ContentTab) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.load_tab(tab).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use crate::config::Config;
    use crate::controller::events::{EventPublisher, SessionEvent};
    use crate::controller::Command;
    use crate::model::AppModel;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn controller() -> (AppController, tokio::sync::mpsc::UnboundedReceiver<crate::controller::events::Envelope>) {
        let (publisher, rx) = EventPublisher::channel();
        let model = Arc::new(Mutex::new(AppModel::new("/art.jpg")));
        (AppController::new(model, publisher, Arc::new(Config::default())), rx)
    }

    #[tokio::test]
    async fn alert_swallows_keys_until_dismissed() {
        let (controller, mut rx) = controller();
        controller.model.lock().await.set_error("oops".into()).await;

        controller.handle_key_event(press(KeyCode::Char(' '))).await.unwrap();
        assert!(rx.try_recv().is_err());

        controller.handle_key_event(press(KeyCode::Esc)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Char(' '))).await.unwrap();
        assert!(matches!(
            rx.try_recv().unwrap().event,
            SessionEvent::Command(Command::TogglePlay)
        ));
    }

    #[tokio::test]
    async fn typing_goes_to_search_box() {
        let (controller, mut rx) = controller();
        controller.handle_key_event(press(KeyCode::Char('/'))).await.unwrap();
        for c in "np".chars() {
            controller.handle_key_event(press(KeyCode::Char(c))).await.unwrap();
        }
        controller.handle_key_event(press(KeyCode::Backspace)).await.unwrap();

        let state = controller.model.lock().await.get_ui_state().await;
        assert_eq!(state.search_query, "n");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn q_quits_outside_search() {
        let (controller, _rx) = controller();
        controller.handle_key_event(press(KeyCode::Char('q'))).await.unwrap();
        assert!(controller.model.lock().await.should_quit().await);
    }
}
