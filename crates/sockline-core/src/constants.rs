//! Core constants for the sockline connection layer.
//!
//! This module defines the defaults shared by the configuration, the message
//! framing and the TCP transport. Keeping them in one place ensures the CLI,
//! the library defaults and the tests all agree on the same values.
//!
//! # Message Delimiter
//!
//! Messages are plain text terminated by the platform line ending:
//!
//! ```text
//! hello remote host\n        (Unix)
//! hello remote host\r\n      (Windows)
//! ```
//!
//! A message is complete when the most recently received chunk ends with
//! [`EOL`]. See `sockline_network::LineFraming` for the exact rule.
//!
//! # Usage
//!
//! ```
//! use sockline_core::constants::*;
//! use std::time::Duration;
//!
//! // Idle timeout is disabled by default
//! assert_eq!(NO_IDLE_TIMEOUT, 0);
//!
//! // A configured idle timeout
//! let idle = Duration::from_millis(DEFAULT_IDLE_TIMEOUT_HINT);
//! assert_eq!(idle.as_secs(), 30);
//! ```

// ============================================================================
// Message Framing
// ============================================================================

/// Platform line ending, used as the default end-of-message delimiter.
///
/// # Examples
///
/// ```
/// use sockline_core::constants::EOL;
///
/// let message = format!("PING{EOL}");
/// assert!(message.ends_with(EOL));
/// ```
#[cfg(windows)]
pub const EOL: &str = "\r\n";

/// Platform line ending, used as the default end-of-message delimiter.
///
/// # Examples
///
/// ```
/// use sockline_core::constants::EOL;
///
/// let message = format!("PING{EOL}");
/// assert!(message.ends_with(EOL));
/// ```
#[cfg(not(windows))]
pub const EOL: &str = "\n";

// ============================================================================
// Connection Defaults
// ============================================================================

/// Idle timeout value meaning "disabled" (milliseconds).
///
/// With the idle timeout disabled the transport never emits a timeout
/// notification and `recv()` waits until data or a close arrives.
pub const NO_IDLE_TIMEOUT: u64 = 0;

/// Suggested idle timeout for interactive use (milliseconds).
///
/// Not applied automatically. The CLI documents it as a reasonable value
/// for `--idle-timeout-ms`.
///
/// # Value: 30000ms (30 seconds)
pub const DEFAULT_IDLE_TIMEOUT_HINT: u64 = 30_000;

/// Default remote host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default remote port.
///
/// Port 0 is never connectable; callers are expected to set a port.
pub const DEFAULT_PORT: u16 = 0;

// ============================================================================
// Transport Buffers
// ============================================================================

/// Capacity reserved for each socket read (bytes).
///
/// Every data notification carries at most this many bytes. Larger
/// messages simply arrive over several notifications.
///
/// # Value: 8192 bytes
pub const READ_CHUNK_SIZE: usize = 8 * 1024;
