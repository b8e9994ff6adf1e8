//! MySmartUSB device implementation
//!
//! This module provides the `MySmartUsb` struct, a thin stateful wrapper
//! around an open transport that maps the high-level programmer operations
//! onto codec dispatches.

use crate::codec::dispatch;
use crate::error::{Error, Result};
use crate::protocol::{decode_version, Command, Mode, Response, MODE_SETTLE_DELAY};
use crate::transport::Transport;

/// Progress of a single `set_mode` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeSwitch {
    /// Current mode not yet known
    Unknown,
    /// Switch command sent, waiting for the device to confirm
    Verifying,
    /// Device reports the requested mode
    Confirmed,
    /// Device still reports another mode after the settling delay
    Failed(u8),
}

/// MySmartUSB programmer
///
/// Owns the transport for the lifetime of the session. Operations take
/// `&mut self`, callers sharing one device across threads must serialize
/// access themselves.
pub struct MySmartUsb<T: Transport> {
    /// Transport layer (serial port)
    transport: T,
    /// Log every frame and envelope as hex
    debug: bool,
}

impl<T: Transport> MySmartUsb<T> {
    /// Wrap an already opened transport
    pub fn new(transport: T, debug: bool) -> Self {
        Self { transport, debug }
    }

    /// Reset the target board
    pub fn reset_board(&mut self) -> Result<()> {
        self.command(Command::ResetBoard)?;
        log::debug!("Board reset");
        Ok(())
    }

    /// Reset the programmer
    ///
    /// The programmer drops its serial endpoint while resetting, so no
    /// reply is awaited.
    pub fn reset_programmer(&mut self) -> Result<()> {
        match dispatch(&mut self.transport, Command::ResetProgrammer, self.debug)? {
            Response::None => {
                log::debug!("Programmer reset");
                Ok(())
            }
            _ => Err(Error::UnexpectedResponse(Command::ResetProgrammer)),
        }
    }

    /// Switch board power on or off
    pub fn set_power(&mut self, on: bool) -> Result<()> {
        self.command(Command::power(on))?;
        log::debug!("Board power {}", if on { "on" } else { "off" });
        Ok(())
    }

    /// Query the current mode byte
    pub fn get_mode(&mut self) -> Result<u8> {
        self.command(Command::QueryMode)
    }

    /// Switch the programmer into `target` mode
    ///
    /// Does nothing if the device already reports `target`. Otherwise the
    /// switch command is sent and, after a settling delay, the mode is
    /// queried once more. There is no further retry.
    pub fn set_mode(&mut self, target: Mode) -> Result<()> {
        let mut state = ModeSwitch::Unknown;

        loop {
            log::debug!("Mode switch to {}: {:?}", target, state);
            state = match state {
                ModeSwitch::Unknown => {
                    if self.get_mode()? == target.as_byte() {
                        ModeSwitch::Confirmed
                    } else {
                        self.command(target.command())?;
                        self.transport.delay(MODE_SETTLE_DELAY);
                        ModeSwitch::Verifying
                    }
                }
                ModeSwitch::Verifying => {
                    let current = self.get_mode()?;
                    if current == target.as_byte() {
                        ModeSwitch::Confirmed
                    } else {
                        ModeSwitch::Failed(current)
                    }
                }
                ModeSwitch::Confirmed => return Ok(()),
                ModeSwitch::Failed(actual) => {
                    return Err(Error::ModeSwitchFailure {
                        wanted: target,
                        actual,
                    })
                }
            };
        }
    }

    /// Read the firmware version string
    pub fn get_version(&mut self) -> Result<String> {
        let payload = match dispatch(&mut self.transport, Command::GetVersion, self.debug)? {
            Response::Version(payload) => payload,
            _ => return Err(Error::UnexpectedResponse(Command::GetVersion)),
        };
        decode_version(&payload).map_err(|e| match e {
            Error::Encoding(byte) => Error::VersionDecode(byte),
            other => other,
        })
    }

    /// Flush pending output and release the transport
    pub fn close(mut self) -> Result<()> {
        self.transport.flush()?;
        log::debug!("Device closed");
        Ok(())
    }

    /// Send a command that answers with a simple envelope
    fn command(&mut self, command: Command) -> Result<u8> {
        match dispatch(&mut self.transport, command, self.debug)? {
            Response::Byte(payload) => Ok(payload),
            _ => Err(Error::UnexpectedResponse(command)),
        }
    }
}
