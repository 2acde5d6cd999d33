//! Connection error taxonomy and classifier.
//!
//! Every failure surfaced by a connection is one of exactly four kinds:
//!
//! | Raw condition | Kind |
//! |---|---|
//! | transport error while connecting | [`ErrorKind::ConnectionRefused`] |
//! | idle timeout while receiving | [`ErrorKind::Timeout`] |
//! | close notification, `had_error = true` | [`ErrorKind::TransmissionError`] |
//! | close notification, `had_error = false` | [`ErrorKind::ConnectionClosed`] |
//! | write completion reports a failure | [`ErrorKind::TransmissionError`] |
//! | transport error while writing or receiving | [`ErrorKind::TransmissionError`] |
//!
//! The constructors on [`ConnectionError`] implement this table. They are
//! meant for the operation adapter; callers only inspect the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The idle timeout elapsed while waiting for a message.
    Timeout,

    /// The remote host closed the connection cleanly.
    ConnectionClosed,

    /// The connection could not be established.
    ConnectionRefused,

    /// The connection failed while data was in flight.
    TransmissionError,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::Timeout,
        ErrorKind::ConnectionClosed,
        ErrorKind::ConnectionRefused,
        ErrorKind::TransmissionError,
    ];

    /// Stable identifier for logs and serialized reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use sockline_core::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::ConnectionRefused.as_str(), "CONNECTION_REFUSED");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ConnectionClosed => "CONNECTION_CLOSED",
            ErrorKind::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorKind::TransmissionError => "TRANSMISSION_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection operation during which an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Connect,
    Write,
    Recv,
}

impl Operation {
    /// Human readable context used as the prefix of error messages.
    pub const fn description(&self) -> &'static str {
        match self {
            Operation::Connect => "Error while connecting to remote host",
            Operation::Write => "Error while sending message to remote host",
            Operation::Recv => "Error while awaiting message from remote host",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Payload of a close notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseSignal {
    /// Whether the transport closed because of a transmission error.
    pub had_error: bool,
}

impl CloseSignal {
    /// Close without error (remote end or local teardown).
    pub const fn clean() -> Self {
        Self { had_error: false }
    }

    /// Close caused by a transmission error.
    pub const fn with_error() -> Self {
        Self { had_error: true }
    }
}

impl fmt::Display for CloseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.had_error {
            f.write_str("connection closed after a transmission error")
        } else {
            f.write_str("connection closed by remote host")
        }
    }
}

/// Original cause wrapped by [`ConnectionError::TransmissionError`].
#[derive(Debug, Error)]
pub enum TransmissionCause {
    /// Close notification with `had_error = true`.
    #[error("{0}")]
    Closed(CloseSignal),

    /// Failure reported by the transport or by a write completion.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Classified connection failure.
///
/// Each variant keeps the lower-level cause it was built from.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Idle timeout notification fired first.
    #[error("Connection timed out while awaiting message from remote host")]
    Timeout {
        operation: Operation,
        /// Idle timeout armed on the transport when the notification fired.
        idle: Option<Duration>,
    },

    /// Close notification without error fired first.
    #[error("{operation}: {signal}")]
    ConnectionClosed {
        operation: Operation,
        signal: CloseSignal,
    },

    /// Transport reported an error before becoming ready.
    #[error("Connection refused: {source}")]
    ConnectionRefused {
        #[source]
        source: io::Error,
    },

    /// Write failure, transport error, or close with error.
    #[error("{operation}: {cause}")]
    TransmissionError {
        operation: Operation,
        #[source]
        cause: TransmissionCause,
    },
}

impl ConnectionError {
    /// Transport error before the ready notification.
    pub fn refused(source: io::Error) -> Self {
        Self::ConnectionRefused { source }
    }

    /// Idle timeout notification during `operation`.
    pub fn idle_timeout(operation: Operation, idle: Option<Duration>) -> Self {
        Self::Timeout { operation, idle }
    }

    /// Close notification during `operation`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sockline_core::{CloseSignal, ConnectionError, ErrorKind, Operation};
    ///
    /// let clean = ConnectionError::closed(Operation::Recv, CloseSignal::clean());
    /// assert_eq!(clean.kind(), ErrorKind::ConnectionClosed);
    ///
    /// let broken = ConnectionError::closed(Operation::Recv, CloseSignal::with_error());
    /// assert_eq!(broken.kind(), ErrorKind::TransmissionError);
    /// ```
    pub fn closed(operation: Operation, signal: CloseSignal) -> Self {
        if signal.had_error {
            Self::TransmissionError {
                operation,
                cause: TransmissionCause::Closed(signal),
            }
        } else {
            Self::ConnectionClosed { operation, signal }
        }
    }

    /// Write completion reported a failure.
    pub fn write_failed(source: io::Error) -> Self {
        Self::transport_failed(Operation::Write, source)
    }

    /// Transport error notification during `operation`.
    pub fn transport_failed(operation: Operation, source: io::Error) -> Self {
        Self::TransmissionError {
            operation,
            cause: TransmissionCause::Io(source),
        }
    }

    /// Classified kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ConnectionClosed { .. } => ErrorKind::ConnectionClosed,
            Self::ConnectionRefused { .. } => ErrorKind::ConnectionRefused,
            Self::TransmissionError { .. } => ErrorKind::TransmissionError,
        }
    }

    /// Operation that was pending when the error was detected.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Timeout { operation, .. }
            | Self::ConnectionClosed { operation, .. }
            | Self::TransmissionError { operation, .. } => *operation,
            Self::ConnectionRefused { .. } => Operation::Connect,
        }
    }

    /// Underlying I/O error, if the cause was one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::ConnectionRefused { source } => Some(source),
            Self::TransmissionError {
                cause: TransmissionCause::Io(source),
                ..
            } => Some(source),
            _ => None,
        }
    }

    /// Close signal, if the cause was a close notification.
    pub fn close_signal(&self) -> Option<CloseSignal> {
        match self {
            Self::ConnectionClosed { signal, .. } => Some(*signal),
            Self::TransmissionError {
                cause: TransmissionCause::Closed(signal),
                ..
            } => Some(*signal),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
