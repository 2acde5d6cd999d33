pub mod config;
pub mod constants;
pub mod error;

pub use config::ConnectionConfig;
pub use error::{CloseSignal, ConnectionError, ErrorKind, Operation, Result, TransmissionCause};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
