//! mysmartusb-core - MySmartUSB programmer control
//!
//! This crate implements the serial command protocol of the MySmartUSB AVR
//! programmer. Besides programming, the device can reset and power the target
//! board and switch between programming, data passthrough and quiet modes.
//!
//! # Protocol Overview
//!
//! Commands are a 7-byte magic prefix (`E6 B5 BA B9 B2 B3 A9`) followed by
//! one ASCII command byte. Most commands are answered with a 5-byte envelope
//! `F7 B1 <payload> 0D 0A` echoing the command byte (or the current mode for
//! a mode query). The version query is answered with a string framed by two
//! `0xF7` bytes, and a programmer reset is not answered at all.
//!
//! The link runs at 19200 baud, 8N1.
//!
//! # Example
//!
//! ```no_run
//! use mysmartusb_core::{open_serial, Mode};
//!
//! let mut msu = open_serial("/dev/ttyUSB0", false)?;
//! println!("Firmware: {}", msu.get_version()?);
//! msu.set_power(true)?;
//! msu.set_mode(Mode::Prog)?;
//! msu.reset_board()?;
//! msu.close()?;
//! # Ok::<(), mysmartusb_core::Error>(())
//! ```

pub mod codec;
pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports
pub use device::MySmartUsb;
pub use error::{Error, Result};
pub use protocol::{Command, Mode, Response};
pub use transport::serial::SerialTransport;
pub use transport::{SerialConfig, Transport};

/// Open a MySmartUSB programmer on a serial port with the default settings
pub fn open_serial(device: &str, debug: bool) -> Result<MySmartUsb<SerialTransport>> {
    open(&SerialConfig::new(device), debug)
}

/// Open a MySmartUSB programmer with explicit serial settings
pub fn open(config: &SerialConfig, debug: bool) -> Result<MySmartUsb<SerialTransport>> {
    let transport = SerialTransport::open(config)?;
    Ok(MySmartUsb::new(transport, debug))
}
