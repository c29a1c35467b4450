//! Periodic progress poll while a track is playing

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::traits::{PlayerSdk, UiSink, UiUpdate};

/// Owns at most one running poll. Starting a poll always cancels the
/// previous one, and dropping the poller cancels it too.
pub struct ProgressPoller {
    sdk: Arc<dyn PlayerSdk>,
    ui: Arc<dyn UiSink>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl ProgressPoller {
    pub fn new(sdk: Arc<dyn PlayerSdk>, ui: Arc<dyn UiSink>, interval: Duration) -> Self {
        Self {
            sdk,
            ui,
            interval,
            handle: None,
        }
    }

    pub fn start(&mut self, position_ms: u32, duration_ms: u32) {
        self.stop();

        self.ui.apply(UiUpdate::Progress {
            position_ms: position_ms.min(duration_ms),
            duration_ms,
        });

        let sdk = self.sdk.clone();
        let ui = self.ui.clone();
        let period = self.interval;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(state) = sdk.current_state() else {
                    continue;
                };
                ui.apply(UiUpdate::Progress {
                    position_ms: state.position_ms.min(state.duration_ms),
                    duration_ms: state.duration_ms,
                });
                if state.duration_ms > 0 && state.position_ms >= state.duration_ms {
                    tracing::trace!("Progress poll reached end of track");
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
