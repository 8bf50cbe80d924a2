//! Owned feed subscription.
//!
//! A [`Subscription`] is the only handle to an upstream feed. It owns the
//! receiving end of a bounded channel and the worker thread driving the
//! source; dropping it (or calling [`Subscription::unsubscribe`]) stops the
//! source and joins the worker.

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Default number of updates buffered between source and consumer.
pub const DEFAULT_FEED_CAPACITY: usize = 1_024;

/// How often a blocked sink re-checks whether the subscription is still open.
const SEND_POLL: Duration = Duration::from_millis(100);

/// One update pushed by the feed, still in its raw text form.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    /// When the update was received from upstream
    pub received_at: DateTime<Utc>,
    /// Raw JSON text of the update
    pub body: String,
}

impl FeedUpdate {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            received_at: Utc::now(),
            body: body.into(),
        }
    }

    pub fn at(received_at: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            received_at,
            body: body.into(),
        }
    }
}

/// Errors raised by feed sources and subscriptions.
#[derive(Debug)]
pub enum FeedError {
    /// The source could not be read
    Io(String),
    /// The worker thread could not be started
    SpawnFailed(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Io(e) => write!(f, "Feed IO error: {e}"),
            FeedError::SpawnFailed(e) => write!(f, "Could not start feed worker: {e}"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Producer handle given to a feed source.
#[derive(Debug, Clone)]
pub struct FeedSink {
    sender: Sender<FeedUpdate>,
    running: Arc<AtomicBool>,
}

impl FeedSink {
    /// Push raw update text, stamped with the current time.
    ///
    /// Returns `false` once the subscription has been torn down; sources
    /// should stop producing at that point.
    pub fn push(&self, body: impl Into<String>) -> bool {
        self.send(FeedUpdate::new(body))
    }

    /// Push a pre-stamped update.
    pub fn send(&self, update: FeedUpdate) -> bool {
        let mut update = update;
        while self.is_running() {
            match self.sender.send_timeout(update, SEND_POLL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(returned)) => update = returned,
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
        false
    }

    /// Whether the owning subscription is still open.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// An upstream push source.
pub trait FeedSource: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce updates into `sink` until exhausted or until the sink reports
    /// the subscription closed.
    fn run(self: Box<Self>, sink: FeedSink) -> Result<(), FeedError>;
}

/// A live subscription to a feed.
pub struct Subscription {
    receiver: Receiver<FeedUpdate>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Start `source` on its own worker thread.
    pub fn open<S: FeedSource>(source: S, capacity: usize) -> Result<Self, FeedError> {
        let (sink, mut subscription) = Self::channel(capacity);
        let source: Box<dyn FeedSource> = Box::new(source);
        let name = source.name().to_string();

        let worker = std::thread::Builder::new()
            .name(format!("feed-{name}"))
            .spawn(move || {
                tracing::debug!(source = %name, "feed source started");
                match source.run(sink) {
                    Ok(()) => tracing::debug!(source = %name, "feed source finished"),
                    Err(e) => tracing::warn!(source = %name, "feed source failed: {e}"),
                }
            })
            .map_err(|e| FeedError::SpawnFailed(e.to_string()))?;

        subscription.worker = Some(worker);
        Ok(subscription)
    }

    /// Create a subscription fed by hand through the returned sink.
    pub fn channel(capacity: usize) -> (FeedSink, Self) {
        let (sender, receiver) = bounded(capacity.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let sink = FeedSink {
            sender,
            running: running.clone(),
        };
        let subscription = Self {
            receiver,
            running,
            worker: None,
        };
        (sink, subscription)
    }

    /// Try to receive an update without blocking.
    pub fn try_recv(&self) -> Option<FeedUpdate> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next update.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<FeedUpdate, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Whether the subscription is still open.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Tear the subscription down, stopping the source.
    pub fn unsubscribe(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("feed worker panicked");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}
