//! Transport layer abstraction for MySmartUSB communication
//!
//! The programmer is attached through a USB serial bridge. All protocol code
//! talks to it through the [`Transport`] trait so it can be driven by a real
//! serial port or a scripted stream in tests.

use crate::error::{Error, Result};
use crate::protocol::DEFAULT_BAUD_RATE;
use std::time::Duration;

/// Transport trait for reading and writing bytes
pub trait Transport {
    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read bytes from the transport
    ///
    /// Blocks until exactly `buf.len()` bytes have been read.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Number of received bytes waiting in the input buffer
    fn bytes_to_read(&mut self) -> Result<usize>;

    /// Flush any buffered output
    fn flush(&mut self) -> Result<()>;

    /// Wait for the device to settle
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        (**self).bytes_to_read()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}

/// Serial port settings
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (e.g., "/dev/ttyUSB0" or "COM1")
    pub device: String,
    /// Baud rate (default: 19200)
    pub baud: u32,
    /// Port-level read timeout. Reads are retried after a timeout, this only
    /// bounds how long a single poll of the port waits.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            baud: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{ErrorKind, Read, Write};

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port configured 8N1 without flow control
        ///
        /// Stale bytes in both directions are discarded after opening.
        pub fn open(config: &SerialConfig) -> Result<Self> {
            let port = serialport::new(config.device.as_str(), config.baud)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(config.read_timeout)
                .open()?;

            port.clear(ClearBuffer::All)?;

            log::info!(
                "Opened serial port {} at {} baud",
                config.device,
                config.baud
            );

            Ok(Self { port })
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            let mut filled = 0;
            while filled < buf.len() {
                match self.port.read(&mut buf[filled..]) {
                    Ok(0) => return Err(Error::Io("serial port closed".into())),
                    Ok(n) => filled += n,
                    // No timeout at the protocol level, keep waiting
                    Err(e) if e.kind() == ErrorKind::TimedOut => {
                        log::trace!("serial: read timed out, {} of {} bytes", filled, buf.len());
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(())
        }

        fn bytes_to_read(&mut self) -> Result<usize> {
            Ok(self.port.bytes_to_read()? as usize)
        }

        fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }
    }
}
