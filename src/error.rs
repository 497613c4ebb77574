//! Error types for S-Link operations.
//!
//! The wire protocol itself carries no acknowledgement layer and never
//! fails: [`send_command`](crate::Slink::send_command) is infallible by
//! design. Errors exist only at the capability boundary (diagnostic sink
//! I/O, command construction).

use thiserror::Error;

/// Result type alias for S-Link operations.
pub type Result<T> = std::result::Result<T, SlinkError>;

/// Error types for S-Link communication.
#[derive(Error, Debug)]
pub enum SlinkError {
    /// General I/O error from a diagnostic sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error from a serial diagnostic sink
    #[cfg(feature = "serial-sink")]
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// The engine was built without a diagnostic sink capability
    #[error("No diagnostic sink available for monitoring")]
    MonitorUnavailable,

    /// A sink was written to before being opened
    #[error("Diagnostic sink not open")]
    SinkNotOpen,

    /// A command must carry 1 to 3 command bytes beyond the device ID
    #[error("Invalid command: {count} command bytes (expected 1 to 3)")]
    InvalidCommand {
        /// Number of command bytes supplied
        count: usize,
    },
}
