//! Cross-thread delivery of ambient targets.
//!
//! A producer (a socket reader, a sensor poller, a UI thread) holds an
//! [`AmbientFeed`] and sends whole readings. The simulation drains its
//! [`AmbientInbox`] between ticks, so it never sees a half-written target.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::environment::Ambient;

/// One message from an ambient producer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FeedMessage {
    /// Move towards an absolute reading.
    Set(Ambient),
    /// Move towards the current reading plus a delta, clamped to `[0, 1]`.
    Nudge(Ambient),
}

/// Sending half; cheap to clone and `Send`.
#[derive(Clone, Debug)]
pub struct AmbientFeed {
    tx: Sender<FeedMessage>,
}

impl AmbientFeed {
    /// Queues an absolute target. Returns `false` once the simulation is gone.
    pub fn set(&self, ambient: Ambient) -> bool {
        self.tx.send(FeedMessage::Set(ambient)).is_ok()
    }

    /// Queues a relative change. Returns `false` once the simulation is gone.
    pub fn nudge(&self, delta: Ambient) -> bool {
        self.tx.send(FeedMessage::Nudge(delta)).is_ok()
    }
}

/// Receiving half, owned by the simulation.
#[derive(Debug)]
pub struct AmbientInbox {
    tx: Sender<FeedMessage>,
    rx: Receiver<FeedMessage>,
}

impl AmbientInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn feed(&self) -> AmbientFeed {
        AmbientFeed {
            tx: self.tx.clone(),
        }
    }

    /// Messages received so far, in arrival order.
    pub fn drain(&self) -> impl Iterator<Item = FeedMessage> + '_ {
        self.rx.try_iter()
    }
}

impl Default for AmbientInbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn messages_arrive_in_order() {
        let inbox = AmbientInbox::new();
        let feed = inbox.feed();
        assert!(feed.set(Ambient::splat(0.1)));
        assert!(feed.nudge(Ambient::new(0.2, 0.0, 0.0)));

        let got: Vec<FeedMessage> = inbox.drain().collect();
        assert_eq!(
            got,
            vec![
                FeedMessage::Set(Ambient::splat(0.1)),
                FeedMessage::Nudge(Ambient::new(0.2, 0.0, 0.0)),
            ]
        );
        assert_eq!(inbox.drain().count(), 0);
    }

    #[test]
    fn feed_works_from_another_thread() {
        let inbox = AmbientInbox::new();
        let feed = inbox.feed();
        thread::spawn(move || {
            feed.set(Ambient::new(1.0, 0.0, 0.5));
        })
        .join()
        .unwrap();

        let got: Vec<FeedMessage> = inbox.drain().collect();
        assert_eq!(got, vec![FeedMessage::Set(Ambient::new(1.0, 0.0, 0.5))]);
    }

    #[test]
    fn send_fails_after_inbox_is_dropped() {
        let inbox = AmbientInbox::new();
        let feed = inbox.feed();
        drop(inbox);
        assert!(!feed.set(Ambient::splat(0.5)));
    }
}
