//! Broadcast fan-out of events to any number of subscribers.
//!
//! Publishing never waits on subscribers. Each subscriber owns its own
//! receiver, so a slow or failing subscriber only affects itself: it lags and
//! skips events, or its handler error is logged and dropped.

use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Default per-subscriber buffer before a subscriber starts to lag.
pub const DEFAULT_BUFFER: usize = 256;

/// Capability to attach subscribers to a stream of events.
pub trait EventPublisher<E> {
    /// Attach a new subscriber. It receives events published from now on
    /// until the publisher closes.
    ///
    /// A subscriber that falls more than the publisher's buffer behind skips
    /// the oldest missed events and resumes with the newest ones still held.
    fn subscribe(&self) -> Subscription<E>;
}

/// Closeable broadcast registry for events of type `E`.
///
/// Clones share the same registry. Publishing takes a shared read lock only,
/// so concurrent publishers never serialize on each other. Closing drops the
/// sender, which ends every subscription.
pub struct EventBus<E> {
    sender: Arc<RwLock<Option<broadcast::Sender<E>>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<E: Clone> EventBus<E> {
    /// Create a new event bus with the provided per-subscriber buffer.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self {
            sender: Arc::new(RwLock::new(Some(sender))),
        }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns how many subscribers received it. Zero when nobody is
    /// subscribed or the bus is closed; neither is an error.
    pub fn publish(&self, event: E) -> usize {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            trace!("event bus closed; dropping event");
            return 0;
        };
        sender.send(event).unwrap_or(0)
    }

    /// Stop publishing and end all subscriptions.
    ///
    /// Returns `true` the first time, `false` when already closed.
    pub fn close(&self) -> bool {
        let mut guard = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        guard.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl<E: Clone> EventPublisher<E> for EventBus<E> {
    fn subscribe(&self) -> Subscription<E> {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        Subscription {
            receiver: guard.as_ref().map(broadcast::Sender::subscribe),
        }
    }
}

/// A single subscriber's view of the event stream.
///
/// Dropping it unsubscribes.
pub struct Subscription<E> {
    receiver: Option<broadcast::Receiver<E>>,
}

impl<E: Clone> Subscription<E> {
    /// Wait for the next event. `None` once the publisher has closed and all
    /// buffered events were delivered.
    pub async fn recv(&mut self) -> Option<E> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagged; skipping missed events");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Next already-published event, without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagged; skipping missed events");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Whether the publisher has closed and every buffered event was consumed.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_none()
    }

    /// Drive `handler` for every event on its own tokio task.
    ///
    /// Handler errors and panics are logged and the subscription keeps going.
    /// The task ends when the publisher closes.
    pub fn spawn<F, Err>(mut self, mut handler: F) -> JoinHandle<()>
    where
        E: Send + 'static,
        F: FnMut(E) -> Result<(), Err> + Send + 'static,
        Err: Display,
    {
        tokio::spawn(async move {
            while let Some(event) = self.recv().await {
                match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => warn!(error = %err, "event handler failed"),
                    Err(_) => warn!("event handler panicked"),
                }
            }
        })
    }
}
