//! Network layer for sockline
//!
//! This crate adapts an event-style duplex transport into a small set of
//! awaitable operations: connect, write, receive one message, close. Every
//! failure is classified into a [`sockline_core::ConnectionError`].
//!
//! # Components
//!
//! - **Connection**: factory and operation adapter
//! - **Transport**: notification model, implemented by `TcpTransport` and
//!   `mock::MockTransport`
//! - **Framing**: per-receive message assembly (`LineFraming` by default)
//!
//! # Example
//!
//! ```no_run
//! use sockline_core::ConnectionConfig;
//! use sockline_network::Connection;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new("127.0.0.1", 7000);
//!
//! let mut conn = Connection::open(&config).await?;
//! conn.write("HELLO\n").await?;
//! let reply = conn.recv().await?;
//! conn.close();
//! # Ok(())
//! # }
//! ```

mod connection;
mod framing;
pub mod mock;
mod tcp;
mod transport;

pub use connection::Connection;
pub use framing::{Framing, LineAssembler, LineFraming, MessageAssembler};
pub use tcp::TcpTransport;
pub use transport::{Transport, TransportEvent, WriteCompletion};
