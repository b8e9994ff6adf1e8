//! MySmartUSB protocol constants and types
//!
//! Every command is sent as a fixed 7-byte magic prefix followed by a single
//! ASCII command byte. Replies come in three shapes:
//!
//! - nothing at all (programmer reset, the device drops its serial endpoint)
//! - a free-form version string framed by two `0xF7` bytes
//! - a 5-byte envelope `F7 B1 <payload> 0D 0A` echoing the command, or the
//!   current mode byte for a mode query

use crate::error::{Error, Result};
use core::fmt;
use std::time::Duration;

/// Magic prefix preceding every command byte
pub const PREFIX: [u8; 7] = [0xE6, 0xB5, 0xBA, 0xB9, 0xB2, 0xB3, 0xA9];

/// Length of an encoded frame (prefix + command byte)
pub const FRAME_LEN: usize = PREFIX.len() + 1;

/// Length of a simple response envelope
pub const ENVELOPE_LEN: usize = 5;
/// First two bytes of an envelope
pub const ENVELOPE_HEAD: [u8; 2] = [0xF7, 0xB1];
/// Last two bytes of an envelope (CR LF)
pub const ENVELOPE_TAIL: [u8; 2] = [0x0D, 0x0A];

/// Marker byte framing the version string
pub const VERSION_DELIMITER: u8 = 0xF7;

/// Baud rate used by the programmer (8N1)
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Time the device needs to push out its full version reply
pub const VERSION_SETTLE_DELAY: Duration = Duration::from_millis(250);
/// Time the device needs to complete a mode switch
pub const MODE_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Device command, identified by a single byte on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Reset the target board
    ResetBoard = b'r',
    /// Reset the programmer itself. No reply is sent.
    ResetProgrammer = b'R',
    /// Switch board power on
    PowerOn = b'+',
    /// Switch board power off
    PowerOff = b'-',
    /// Query the current mode
    QueryMode = b'i',
    /// Enter programming mode
    SetModeProg = b'p',
    /// Enter data mode
    SetModeData = b'd',
    /// Enter quiet mode
    SetModeQuiet = b'q',
    /// Read the firmware version string
    GetVersion = b'v',
}

impl Command {
    /// All known commands
    pub const ALL: [Command; 9] = [
        Command::ResetBoard,
        Command::ResetProgrammer,
        Command::PowerOn,
        Command::PowerOff,
        Command::QueryMode,
        Command::SetModeProg,
        Command::SetModeData,
        Command::SetModeQuiet,
        Command::GetVersion,
    ];

    /// The byte sent on the wire
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Command that switches board power to the given state
    pub const fn power(on: bool) -> Self {
        if on {
            Command::PowerOn
        } else {
            Command::PowerOff
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::ResetBoard => "reset-board",
            Command::ResetProgrammer => "reset-programmer",
            Command::PowerOn => "power-on",
            Command::PowerOff => "power-off",
            Command::QueryMode => "query-mode",
            Command::SetModeProg => "set-mode-prog",
            Command::SetModeData => "set-mode-data",
            Command::SetModeQuiet => "set-mode-quiet",
            Command::GetVersion => "get-version",
        };
        f.write_str(name)
    }
}

/// Programmer operating mode
///
/// The mode byte reported by a mode query is the same byte as the command
/// that selects the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    /// ISP programming mode
    Prog = b'p',
    /// Serial data passthrough mode
    Data = b'd',
    /// Quiet mode
    Quiet = b'q',
}

impl Mode {
    /// The mode byte as reported by the device
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Command that switches the programmer into this mode
    pub const fn command(self) -> Command {
        match self {
            Mode::Prog => Command::SetModeProg,
            Mode::Data => Command::SetModeData,
            Mode::Quiet => Command::SetModeQuiet,
        }
    }
}

impl core::str::FromStr for Mode {
    type Err = String;

    /// Parse a mode letter (`p`, `d` or `q`, case-insensitive)
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p" => Ok(Mode::Prog),
            "d" => Ok(Mode::Data),
            "q" => Ok(Mode::Quiet),
            _ => Err(format!("Invalid mode: {}", s)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Prog => "prog",
            Mode::Data => "data",
            Mode::Quiet => "quiet",
        };
        f.write_str(name)
    }
}

/// Reply to a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// No reply is read (programmer reset)
    None,
    /// Payload byte of a simple envelope
    Byte(u8),
    /// Raw version payload, between the two `0xF7` markers
    Version(Vec<u8>),
}

/// Build the wire frame for a command
pub fn encode_frame(command: Command) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..PREFIX.len()].copy_from_slice(&PREFIX);
    frame[PREFIX.len()] = command.as_byte();
    frame
}

/// Render bytes as contiguous uppercase hex
pub fn hexdump(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Fixed-width window slid over the reply stream until an envelope aligns
#[derive(Debug, Clone, Default)]
pub struct EnvelopeWindow {
    bytes: [u8; ENVELOPE_LEN],
}

impl EnvelopeWindow {
    /// Create an empty window
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the window holds a complete envelope
    pub fn is_aligned(&self) -> bool {
        self.bytes[..2] == ENVELOPE_HEAD && self.bytes[3..] == ENVELOPE_TAIL
    }

    /// Drop the oldest byte and return the freed slot at the end
    pub fn shift(&mut self) -> &mut [u8] {
        self.bytes.copy_within(1.., 0);
        &mut self.bytes[ENVELOPE_LEN - 1..]
    }

    /// Payload byte (position 2)
    pub fn payload(&self) -> u8 {
        self.bytes[2]
    }

    /// Raw window contents
    pub fn as_bytes(&self) -> &[u8; ENVELOPE_LEN] {
        &self.bytes
    }

    /// Mutable window contents, used to fill the window initially
    pub fn as_mut_bytes(&mut self) -> &mut [u8; ENVELOPE_LEN] {
        &mut self.bytes
    }
}

/// Extract the version payload framed by two `0xF7` markers
///
/// Returns the bytes strictly after the first marker and strictly before the
/// next one.
pub fn extract_version_payload(buffered: &[u8]) -> Result<&[u8]> {
    let start = buffered
        .iter()
        .position(|&b| b == VERSION_DELIMITER)
        .ok_or(Error::MissingVersionDelimiter)?;
    let rest = &buffered[start + 1..];
    let end = rest
        .iter()
        .position(|&b| b == VERSION_DELIMITER)
        .ok_or(Error::MissingVersionDelimiter)?;
    Ok(&rest[..end])
}

/// Decode a version payload as printable 7-bit ASCII
///
/// Tabs and line breaks are allowed, every other control character or
/// 8-bit byte is rejected.
pub fn decode_version(payload: &[u8]) -> Result<String> {
    if let Some(&bad) = payload
        .iter()
        .find(|&&b| !(b.is_ascii_graphic() || b == b' ' || b.is_ascii_whitespace()))
    {
        return Err(Error::Encoding(bad));
    }
    // Only ASCII bytes remain, so this is lossless
    Ok(payload.iter().map(|&b| b as char).collect())
}
