//! Event channel implementation using crossbeam-channel.
//!
//! The engine is the only producer; consumers (CLI progress bar, audit
//! log) drain the receiver on their own thread.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{Event, OutcomeKind};

/// Sends events from the engine.
///
/// Cheap to clone and safe to move into the worker thread. If the
/// receiver is dropped, events are silently discarded so a run never
/// fails because nobody is listening.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }

    /// Report one file's outcome followed by the progress it leaves behind.
    ///
    /// Every `FileResult` is immediately followed by its `Progress`, so a
    /// consumer can treat the pair as one step.
    pub fn file_done(
        &self,
        file_name: String,
        outcome: OutcomeKind,
        message: String,
        percent: u8,
    ) {
        self.send(Event::FileResult {
            file_name: file_name.clone(),
            outcome,
            message,
        });
        self.send(Event::Progress { percent, file_name });
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(Event::StatusText {
            message: message.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Event::Error {
            message: message.into(),
        });
    }
}

/// Receives events from the engine.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Ends once every sender has been dropped, which happens when the
    /// run has sent `Finished`.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for connected sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    ///
    /// Unbounded so the engine never waits on a slow terminal.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone, for headless runs and tests.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
