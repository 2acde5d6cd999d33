//! Connection: factory and operation adapter.
//!
//! This module turns the notification stream of a [`Transport`] into four
//! awaitable operations. Each operation races the notifications it cares
//! about; the first terminal notification decides the outcome and every
//! other notification is inert for that call.
//!
//! # Architecture
//!
//! ```text
//! Caller
//!   │
//!   ├─> Connection::open / establish ── Ready | Error
//!   │
//!   ├─> write(message) ──────────────── completion | Close
//!   │
//!   ├─> recv() ──────────────────────── Data..delimiter | Timeout | Close
//!   │
//!   └─> close() ─────────────────────── Transport::destroy()
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use sockline_core::ConnectionConfig;
//! use sockline_network::Connection;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new("127.0.0.1", 7000).idle_timeout_ms(3000);
//!
//! let mut conn = Connection::open(&config).await?;
//! conn.write("PING\n").await?;
//! let reply = conn.recv().await?;
//! println!("Received: {reply:?}");
//!
//! conn.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: every failure is returned, classified, to the caller
//! - **No implicit close**: a failed operation leaves the transport as it is
//! - **One operation at a time**: `write` and `recv` take `&mut self`, so
//!   overlapping operations on one connection do not compile
//! - **No buffering across calls**: each `recv` starts with an empty
//!   accumulator

use bytes::Bytes;
use std::io;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::framing::{Framing, LineFraming, MessageAssembler};
use crate::tcp::TcpTransport;
use crate::transport::{Transport, TransportEvent};
use sockline_core::{CloseSignal, ConnectionConfig, ConnectionError, Operation, Result};

/// Connected handle over a transport.
///
/// Created only through [`Connection::open`] or [`Connection::establish`],
/// which resolve once the transport reported it is ready.
///
/// # Connection Lifecycle
///
/// 1. Open with `open()` (TCP) or `establish()` (any transport)
/// 2. Exchange messages with `write()` and `recv()`
/// 3. Tear down with `close()`
///
/// # Cancellation
///
/// There is no abort operation. Dropping a pending `write` or `recv` future
/// stops waiting but leaves the transport untouched; a write that was
/// already handed to the transport may still go out.
pub struct Connection<T: Transport = TcpTransport, F: Framing = LineFraming> {
    transport: T,
    framing: F,

    /// Idle timeout armed on the transport
    idle_timeout: Option<Duration>,
}

impl Connection {
    /// Open a TCP connection described by `config`
    ///
    /// Arms the configured idle timeout and frames messages with the
    /// configured delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConnectionRefused`] if the transport fails
    /// before it becomes ready (unknown host, refused, unreachable, ...).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sockline_core::ConnectionConfig;
    /// use sockline_network::Connection;
    ///
    /// # async fn example() -> sockline_core::Result<()> {
    /// let conn = Connection::open(&ConnectionConfig::new("localhost", 25)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(config: &ConnectionConfig) -> Result<Self> {
        info!("Connecting to {}", config.address());

        let transport = TcpTransport::connect(config.host.clone(), config.port);
        let framing = LineFraming::new(config.delimiter.clone());

        let conn = Self::establish(transport, config.idle_timeout(), framing).await?;
        info!("Successfully connected to {}", config.address());
        Ok(conn)
    }
}

impl<T: Transport, F: Framing> Connection<T, F> {
    /// Wrap a transport once it reports ready
    ///
    /// The idle timeout is armed before the first notification is read.
    /// The first of {Ready, Error} decides the outcome; any other
    /// notification seen meanwhile is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConnectionRefused`] wrapping the transport
    /// error, or a `NotConnected` error if the transport is exhausted before
    /// either notification.
    pub async fn establish(
        mut transport: T,
        idle_timeout: Option<Duration>,
        framing: F,
    ) -> Result<Self> {
        transport.set_idle_timeout(idle_timeout);

        loop {
            match transport.next_event().await {
                Some(TransportEvent::Ready) => {
                    debug!("Connection ready");
                    return Ok(Self {
                        transport,
                        framing,
                        idle_timeout,
                    });
                }
                Some(TransportEvent::Error(e)) => {
                    warn!("Connection failed: {}", e);
                    return Err(ConnectionError::refused(e));
                }
                Some(event) => {
                    trace!(event = event.name(), "Ignoring notification while connecting");
                }
                None => {
                    warn!("Transport closed before becoming ready");
                    return Err(ConnectionError::refused(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "transport closed before becoming ready",
                    )));
                }
            }
        }
    }

    /// Send a message to the remote host
    ///
    /// Resolves once the write completes, or fails with the first close or
    /// error notification that arrives before it.
    ///
    /// Completion is checked before any notification. A write that completes
    /// immediately reads no notifications, so data already queued stays for
    /// the next `recv`. Only data notifications observed while the write is
    /// still pending are discarded.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::TransmissionError`] if the write completion
    ///   reports a failure, the transport reports an error, or it closes
    ///   with an error
    /// - [`ConnectionError::ConnectionClosed`] if it closes cleanly first
    pub async fn write(&mut self, message: impl AsRef<[u8]>) -> Result<()> {
        let payload = Bytes::copy_from_slice(message.as_ref());
        trace!(bytes = payload.len(), "Sending message to remote host");

        let mut completion = self.transport.write(payload);

        loop {
            tokio::select! {
                biased;

                result = &mut completion => {
                    return match result {
                        Ok(()) => {
                            trace!("Message sent successfully");
                            Ok(())
                        }
                        Err(e) => {
                            warn!("Failed to send message: {}", e);
                            Err(ConnectionError::write_failed(e))
                        }
                    };
                }

                event = self.transport.next_event() => match event {
                    Some(TransportEvent::Close { had_error }) => {
                        warn!(had_error, "Connection closed while sending");
                        return Err(ConnectionError::closed(Operation::Write, CloseSignal { had_error }));
                    }
                    Some(TransportEvent::Error(e)) => {
                        warn!("Transport error while sending: {}", e);
                        return Err(ConnectionError::transport_failed(Operation::Write, e));
                    }
                    Some(TransportEvent::Data(chunk)) => {
                        trace!(bytes = chunk.len(), "Discarding data received while sending");
                    }
                    Some(event) => {
                        trace!(event = event.name(), "Ignoring notification while sending");
                    }
                    None => {
                        warn!("Transport exhausted while sending");
                        return Err(ConnectionError::closed(Operation::Write, CloseSignal::clean()));
                    }
                },
            }
        }
    }

    /// Receive one complete message
    ///
    /// Accumulates data notifications until the framing reports a complete
    /// message and returns it, delimiter included.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::Timeout`] if the idle timeout fires first
    /// - [`ConnectionError::ConnectionClosed`] if the transport closes cleanly
    ///   (or is exhausted) first
    /// - [`ConnectionError::TransmissionError`] if it closes with an error or
    ///   reports an error first
    pub async fn recv(&mut self) -> Result<String> {
        trace!("Waiting for message from remote host");

        let mut assembler = self.framing.assembler();

        loop {
            match self.transport.next_event().await {
                Some(TransportEvent::Data(chunk)) => {
                    trace!(bytes = chunk.len(), "Received chunk");
                    if let Some(message) = assembler.push(&chunk) {
                        trace!(bytes = message.len(), "Received message from remote host");
                        return Ok(message);
                    }
                }
                Some(TransportEvent::Timeout) => {
                    warn!(idle_timeout = ?self.idle_timeout, "Idle timeout while receiving");
                    return Err(ConnectionError::idle_timeout(Operation::Recv, self.idle_timeout));
                }
                Some(TransportEvent::Close { had_error }) => {
                    warn!(had_error, "Connection closed while receiving");
                    return Err(ConnectionError::closed(Operation::Recv, CloseSignal { had_error }));
                }
                Some(TransportEvent::Error(e)) => {
                    warn!("Transport error while receiving: {}", e);
                    return Err(ConnectionError::transport_failed(Operation::Recv, e));
                }
                Some(TransportEvent::Ready) => {
                    trace!("Ignoring ready notification while receiving");
                }
                None => {
                    warn!("Transport exhausted while receiving");
                    return Err(ConnectionError::closed(Operation::Recv, CloseSignal::clean()));
                }
            }
        }
    }

    /// Tear the transport down immediately
    ///
    /// Synchronous and infallible. Every call is forwarded to
    /// [`Transport::destroy`], which ignores repeated calls.
    pub fn close(&mut self) {
        info!("Closing connection");
        self.transport.destroy();
    }

    /// Idle timeout armed on the transport
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Framing used by `recv`
    pub fn framing(&self) -> &F {
        &self.framing
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
