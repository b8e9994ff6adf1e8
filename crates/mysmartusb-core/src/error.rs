//! Error types for MySmartUSB operations

use crate::protocol::{Command, Mode};
use thiserror::Error;

/// MySmartUSB device errors
#[derive(Debug, Error)]
pub enum Error {
    /// The envelope echoed a different byte than the command that was sent
    #[error("Invalid command return: {0:02X}")]
    ProtocolMismatch(u8),

    /// A byte in the version payload is not printable 7-bit ASCII
    #[error("Non-ASCII byte 0x{0:02X} in version payload")]
    Encoding(u8),

    /// The version string could not be decoded
    #[error("Failed to read version string (invalid byte 0x{0:02X})")]
    VersionDecode(u8),

    /// The device did not report the requested mode after switching
    #[error("Failed to set mode: wanted {wanted}, device reports 0x{actual:02X}")]
    ModeSwitchFailure { wanted: Mode, actual: u8 },

    /// A dispatched command produced a reply of the wrong shape
    #[error("Unexpected reply shape for command {0}")]
    UnexpectedResponse(Command),

    /// The version reply is not framed by two 0xF7 markers
    #[error("Version reply is missing the 0xF7 delimiter")]
    MissingVersionDelimiter,

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type for MySmartUSB operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
