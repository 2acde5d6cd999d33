//! Mock transport implementation for testing and development.
//!
//! This module provides a scripted transport that can be driven
//! programmatically, so connection behavior can be tested without sockets:
//! every notification is injected through a [`MockTransportHandle`], every
//! write is recorded, and write outcomes are chosen by the test.

use bytes::Bytes;
use futures::future;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::transport::{Transport, TransportEvent, WriteCompletion};

/// How the mock completes the next write.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Complete immediately with success.
    Complete,

    /// Complete immediately with the given error.
    Fail(io::Error),

    /// Stay pending until [`MockTransportHandle::complete_write`] is called.
    Hold,
}

/// State shared between the transport and its handle.
#[derive(Debug, Default)]
struct Shared {
    writes: Mutex<Vec<Bytes>>,
    outcomes: Mutex<VecDeque<WriteOutcome>>,
    held: Mutex<VecDeque<oneshot::Sender<io::Result<()>>>>,
    idle_timeout: Mutex<Option<Duration>>,
    destroy_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock transport for testing.
///
/// # Examples
///
/// ```
/// use sockline_network::mock::MockTransport;
/// use sockline_network::{Transport, TransportEvent};
///
/// #[tokio::main]
/// async fn main() {
///     let (mut transport, handle) = MockTransport::new();
///
///     handle.ready();
///     handle.data("PONG\n");
///
///     assert!(matches!(transport.next_event().await, Some(TransportEvent::Ready)));
///     assert!(matches!(transport.next_event().await, Some(TransportEvent::Data(_))));
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    /// Channel receiver for injected notifications
    events: mpsc::UnboundedReceiver<TransportEvent>,

    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a new mock transport.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle is used to inject notifications and inspect writes.
    pub fn new() -> (Self, MockTransportHandle) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());

        let transport = Self {
            events,
            shared: Arc::clone(&shared),
        };

        let handle = MockTransportHandle { events_tx, shared };

        (transport, handle)
    }
}

impl Transport for MockTransport {
    fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
        *lock(&self.shared.idle_timeout) = timeout;
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    fn write(&mut self, payload: Bytes) -> WriteCompletion {
        lock(&self.shared.writes).push(payload);

        let outcome = lock(&self.shared.outcomes)
            .pop_front()
            .unwrap_or(WriteOutcome::Complete);

        match outcome {
            WriteOutcome::Complete => Box::pin(future::ready(Ok(()))),
            WriteOutcome::Fail(e) => Box::pin(future::ready(Err(e))),
            WriteOutcome::Hold => {
                let (tx, rx) = oneshot::channel();
                lock(&self.shared.held).push_back(tx);
                Box::pin(async move {
                    rx.await.unwrap_or_else(|_| {
                        Err(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "held write abandoned by mock handle",
                        ))
                    })
                })
            }
        }
    }

    fn destroy(&mut self) {
        self.shared.destroy_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handle for driving a [`MockTransport`].
///
/// Dropping the handle ends the notification stream: the transport then
/// reports `None` from `next_event`.
#[derive(Debug)]
pub struct MockTransportHandle {
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    shared: Arc<Shared>,
}

impl MockTransportHandle {
    /// Inject an arbitrary notification.
    ///
    /// Notifications sent after the transport was dropped are discarded.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Inject a `Ready` notification.
    pub fn ready(&self) {
        self.emit(TransportEvent::Ready);
    }

    /// Inject a `Data` notification.
    pub fn data(&self, chunk: impl AsRef<[u8]>) {
        self.emit(TransportEvent::Data(Bytes::copy_from_slice(chunk.as_ref())));
    }

    /// Inject a `Timeout` notification.
    pub fn timeout(&self) {
        self.emit(TransportEvent::Timeout);
    }

    /// Inject a `Close` notification.
    pub fn close(&self, had_error: bool) {
        self.emit(TransportEvent::Close { had_error });
    }

    /// Inject an `Error` notification.
    pub fn error(&self, error: io::Error) {
        self.emit(TransportEvent::Error(error));
    }

    /// Decide how the next unscripted write completes.
    ///
    /// Outcomes are consumed in order; writes without a scripted outcome
    /// complete successfully.
    pub fn script_write(&self, outcome: WriteOutcome) {
        lock(&self.shared.outcomes).push_back(outcome);
    }

    /// Complete the oldest held write.
    ///
    /// Returns `false` if no write is being held.
    pub fn complete_write(&self, result: io::Result<()>) -> bool {
        match lock(&self.shared.held).pop_front() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Payloads written so far, in order.
    pub fn writes(&self) -> Vec<Bytes> {
        lock(&self.shared.writes).clone()
    }

    /// Number of times `destroy` was called.
    pub fn destroy_calls(&self) -> usize {
        self.shared.destroy_calls.load(Ordering::SeqCst)
    }

    /// Idle timeout currently armed on the transport.
    pub fn idle_timeout(&self) -> Option<Duration> {
        *lock(&self.shared.idle_timeout)
    }
}
