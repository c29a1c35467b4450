//! Session event channel
//!
//! Player callbacks and user commands are funnelled into one channel that the
//! reconciler consumes. Every event carries a sequence number taken when it is
//! observed, so a state notification that was captured before a newer action
//! can be recognised as stale and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::{PlayerState, TrackRef};

/// Notifications coming from the playback SDK
#[derive(Clone, Debug)]
pub enum SdkEvent {
    /// Player is registered and can receive playback
    Ready { device_name: String },
    /// `None` means nothing is loaded any more
    StateChanged(Option<PlayerState>),
    /// Explicit end-of-track signal for the given URI
    TrackEnded { uri: String },
    Error { message: String },
}

/// User-initiated actions
#[derive(Clone, Debug)]
pub enum Command {
    /// Replace the queue with a listing and play the entry at `index`
    PlayFrom { tracks: Vec<TrackRef>, index: usize },
    /// Play the queue entry at `index`; `uri` locates it if the queue has moved since
    PlayAt { index: usize, uri: String },
    Enqueue(Vec<TrackRef>),
    RemoveFromQueue { id: String },
    Next,
    Previous,
    TogglePlay,
    Seek { position_ms: u32 },
    SeekBy { offset_ms: i64 },
    SetVolume { percent: u8 },
    ChangeVolume { delta: i16 },
    Shutdown,
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
    Sdk(SdkEvent),
    Command(Command),
}

#[derive(Clone, Debug)]
pub struct Envelope {
    pub seq: u64,
    pub event: SessionEvent,
}

/// Cloneable sending half of the session channel.
#[derive(Clone)]
pub struct EventPublisher {
    next_seq: Arc<AtomicU64>,
    sender: UnboundedSender<Envelope>,
}

impl EventPublisher {
    pub fn channel() -> (Self, UnboundedReceiver<Envelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let publisher = Self {
            next_seq: Arc::new(AtomicU64::new(1)),
            sender,
        };
        (publisher, receiver)
    }

    /// Reserve the next sequence number. Use with [`send_stamped`] when the
    /// event is observed some time before it can be sent.
    ///
    /// [`send_stamped`]: EventPublisher::send_stamped
    pub fn stamp(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    pub fn send_stamped(&self, seq: u64, event: SessionEvent) -> bool {
        match self.sender.send(Envelope { seq, event }) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(seq, "Session channel closed, event dropped");
                false
            }
        }
    }

    pub fn publish(&self, event: SessionEvent) -> bool {
        let seq = self.stamp();
        self.send_stamped(seq, event)
    }

    pub fn sdk(&self, event: SdkEvent) -> bool {
        self.publish(SessionEvent::Sdk(event))
    }

    pub fn command(&self, command: Command) -> bool {
        self.publish(SessionEvent::Command(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_numbers_increase() {
        let (publisher, mut rx) = EventPublisher::channel();
        publisher.command(Command::Next);
        publisher.clone().sdk(SdkEvent::StateChanged(None));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.seq < second.seq);
        assert!(matches!(first.event, SessionEvent::Command(Command::Next)));
    }

    #[tokio::test]
    async fn stamped_events_keep_their_number() {
        let (publisher, mut rx) = EventPublisher::channel();
        let early = publisher.stamp();
        publisher.command(Command::TogglePlay);
        publisher.send_stamped(early, SessionEvent::Sdk(SdkEvent::StateChanged(None)));

        let newer = rx.recv().await.unwrap();
        let late = rx.recv().await.unwrap();
        assert!(late.seq < newer.seq);
    }

    #[test]
    fn send_fails_once_receiver_is_gone() {
        let (publisher, rx) = EventPublisher::channel();
        drop(rx);
        assert!(!publisher.command(Command::Next));
    }
}
