//! TCP transport on top of tokio.
//!
//! [`TcpTransport`] turns a [`TcpStream`] into the notification model of
//! [`Transport`]:
//!
//! ```text
//! connect ──> Ready | Error ─> Close(true)
//!                │
//!                ├─> Data(chunk)*        read returned bytes
//!                ├─> Timeout             idle timer won the race
//!                ├─> Close(false)        EOF or destroy()
//!                └─> Error ─> Close(true) read failed
//! ```
//!
//! # Design
//!
//! No task is spawned. The connect future is stored and driven by the first
//! call to [`next_event`](Transport::next_event); reads happen inside
//! `next_event` itself. The write half lives behind an `Arc<Mutex<_>>` so a
//! [`WriteCompletion`] can own it without borrowing the transport.
//!
//! # Idle Timeout
//!
//! The timer is re-armed every time `next_event` starts waiting for data.
//! Writes do not reset it.

use bytes::{Bytes, BytesMut};
use futures::future::{self, BoxFuture};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::transport::{Transport, TransportEvent, WriteCompletion};
use sockline_core::constants::READ_CHUNK_SIZE;

enum State {
    /// TCP handshake in progress
    Connecting(BoxFuture<'static, io::Result<TcpStream>>),

    /// Connected
    Open {
        reader: OwnedReadHalf,
        writer: Arc<Mutex<OwnedWriteHalf>>,
    },

    /// Destroyed, failed to connect, or reached EOF
    Closed,
}

/// TCP transport
///
/// # Example
///
/// ```no_run
/// use sockline_network::{TcpTransport, Transport, TransportEvent};
///
/// # async fn example() {
/// let mut transport = TcpTransport::connect("127.0.0.1", 7000);
///
/// match transport.next_event().await {
///     Some(TransportEvent::Ready) => println!("connected"),
///     other => println!("not connected: {:?}", other),
/// }
///
/// transport.destroy();
/// # }
/// ```
pub struct TcpTransport {
    /// `host:port`, for logging
    peer: String,

    state: State,

    /// Notifications produced but not yet handed out
    pending: VecDeque<TransportEvent>,

    /// Read buffer, split into `Data` chunks
    buffer: BytesMut,

    idle_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Start connecting to `host:port`
    ///
    /// Name resolution and the TCP handshake run when the transport is first
    /// polled through [`next_event`](Transport::next_event).
    pub fn connect(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let peer = format!("{host}:{port}");
        debug!("Creating TCP transport for {}", peer);

        let connecting = Box::pin(async move { TcpStream::connect((host.as_str(), port)).await });

        Self {
            peer,
            state: State::Connecting(connecting),
            pending: VecDeque::new(),
            buffer: BytesMut::new(),
            idle_timeout: None,
        }
    }

    /// Remote `host:port`
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Check if the socket is connected and not yet closed
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    fn on_connected(&mut self, outcome: io::Result<TcpStream>) -> TransportEvent {
        match outcome {
            Ok(stream) => {
                // Messages are small and latency bound; Nagle would hold them back
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY on {}: {}", self.peer, e);
                }

                let (reader, writer) = stream.into_split();
                self.state = State::Open {
                    reader,
                    writer: Arc::new(Mutex::new(writer)),
                };

                debug!("Transport to {} ready", self.peer);
                TransportEvent::Ready
            }
            Err(e) => {
                debug!("Connection to {} failed: {}", self.peer, e);
                self.state = State::Closed;
                self.pending.push_back(TransportEvent::Close { had_error: true });
                TransportEvent::Error(e)
            }
        }
    }

    fn on_read(&mut self, outcome: io::Result<usize>) -> TransportEvent {
        match outcome {
            Ok(0) => {
                debug!("Remote host {} closed the connection", self.peer);
                self.state = State::Closed;
                TransportEvent::Close { had_error: false }
            }
            Ok(n) => {
                trace!(bytes = n, "Read from {}", self.peer);
                let chunk: Bytes = self.buffer.split_to(n).freeze();
                TransportEvent::Data(chunk)
            }
            Err(e) => {
                warn!("Read from {} failed: {}", self.peer, e);
                self.state = State::Closed;
                self.pending.push_back(TransportEvent::Close { had_error: true });
                TransportEvent::Error(e)
            }
        }
    }
}

impl Transport for TcpTransport {
    fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
        self.idle_timeout = timeout.filter(|idle| !idle.is_zero());
        trace!(idle_timeout = ?self.idle_timeout, "Idle timeout set for {}", self.peer);
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        if let State::Connecting(connecting) = &mut self.state {
            let outcome = connecting.await;
            return Some(self.on_connected(outcome));
        }

        let State::Open { reader, .. } = &mut self.state else {
            return None;
        };

        self.buffer.reserve(READ_CHUNK_SIZE);
        let read = reader.read_buf(&mut self.buffer);

        let outcome = match self.idle_timeout {
            Some(idle) => match tokio::time::timeout(idle, read).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    trace!("Idle timeout ({}ms) on {}", idle.as_millis(), self.peer);
                    return Some(TransportEvent::Timeout);
                }
            },
            None => read.await,
        };

        Some(self.on_read(outcome))
    }

    fn write(&mut self, payload: Bytes) -> WriteCompletion {
        let State::Open { writer, .. } = &self.state else {
            trace!("Write on {} while not connected", self.peer);
            return Box::pin(future::ready(Err(io::Error::from(
                io::ErrorKind::NotConnected,
            ))));
        };

        let writer = Arc::clone(writer);
        Box::pin(async move {
            let mut writer = writer.lock().await;
            writer.write_all(&payload).await?;
            writer.flush().await
        })
    }

    fn destroy(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Closed => trace!("Transport to {} already destroyed", self.peer),
            _ => {
                debug!("Transport to {} destroyed", self.peer);
                self.pending.push_back(TransportEvent::Close { had_error: false });
            }
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_open() {
            debug!("TcpTransport to {} dropped while open - socket will be closed", self.peer);
        }
    }
}
