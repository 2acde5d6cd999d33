//! Transport abstraction.
//!
//! A transport is the duplex byte stream underneath a
//! [`Connection`](crate::Connection). It reports its lifecycle as a sequence
//! of [`TransportEvent`] notifications and accepts writes whose completion is
//! observed through a separate future, so a pending write can be raced
//! against the notification stream.
//!
//! Two implementations are provided:
//! - [`TcpTransport`](crate::TcpTransport): tokio TCP socket
//! - [`MockTransport`](crate::mock::MockTransport): scripted, for tests
//!
//! All traits use native `async fn` methods (Edition 2024 RPITIT), so no
//! `async_trait` macro is needed.

#![allow(async_fn_in_trait)]

use bytes::Bytes;
use futures::future::BoxFuture;
use std::io;
use std::time::Duration;

/// Notification emitted by a transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// The transport is connected and usable.
    Ready,

    /// A chunk of bytes arrived.
    Data(Bytes),

    /// The idle timeout elapsed without activity.
    ///
    /// The transport stays open; it is up to the consumer to react.
    Timeout,

    /// The transport closed. `had_error` is set when the close was caused by
    /// a transmission error.
    Close { had_error: bool },

    /// The transport failed. A `Close { had_error: true }` always follows.
    Error(io::Error),
}

impl TransportEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Ready => "ready",
            TransportEvent::Data(_) => "data",
            TransportEvent::Timeout => "timeout",
            TransportEvent::Close { .. } => "close",
            TransportEvent::Error(_) => "error",
        }
    }
}

/// Completion of a single write.
///
/// Resolves once the payload has been handed to the operating system, or
/// with the error that prevented it. The future does not borrow the
/// transport.
pub type WriteCompletion = BoxFuture<'static, io::Result<()>>;

/// Duplex byte stream with event-style notifications.
///
/// # Cancellation
///
/// [`next_event`](Transport::next_event) is raced against write completions
/// with `tokio::select!`, so implementations must be cancel safe: dropping
/// the returned future before it resolves must not lose a notification.
pub trait Transport {
    /// Arm (`Some`) or disarm (`None`) the idle timeout.
    ///
    /// While armed, a [`TransportEvent::Timeout`] is emitted whenever the
    /// transport waits longer than the duration for incoming data.
    fn set_idle_timeout(&mut self, timeout: Option<Duration>);

    /// Wait for the next notification.
    ///
    /// Returns `None` once the transport is exhausted and will never emit
    /// again.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Issue a write of `payload`.
    fn write(&mut self, payload: Bytes) -> WriteCompletion;

    /// Tear the transport down immediately.
    ///
    /// Calling it on an already destroyed transport does nothing.
    fn destroy(&mut self);
}
