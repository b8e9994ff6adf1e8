//! Command/response codec
//!
//! Frames commands onto a [`Transport`] and pulls the matching reply back out
//! of the input stream. The device may emit stray bytes around an envelope,
//! so simple replies are found by sliding a 5-byte window over the stream
//! until both envelope markers line up.

use crate::error::{Error, Result};
use crate::protocol::{
    encode_frame, extract_version_payload, hexdump, Command, EnvelopeWindow, Response,
    VERSION_SETTLE_DELAY,
};
use crate::transport::Transport;

/// Write the frame for `command` and flush it onto the wire
pub fn send_frame<T: Transport + ?Sized>(
    transport: &mut T,
    command: Command,
    debug: bool,
) -> Result<()> {
    let frame = encode_frame(command);
    if debug {
        log::debug!("Sending command: {}", hexdump(&frame));
    }
    transport.write(&frame)?;
    transport.flush()
}

/// Read a simple `F7 B1 <payload> 0D 0A` reply and return its payload byte
///
/// Leading garbage is skipped one byte at a time, so exactly `K + 5` bytes
/// are consumed when `K` stray bytes precede the envelope. Blocks until an
/// envelope is found.
///
/// For a mode query any payload is accepted (it is the current mode byte),
/// otherwise the payload must echo `expected`.
pub fn read_simple_response<T: Transport + ?Sized>(
    transport: &mut T,
    expected: Command,
    debug: bool,
) -> Result<u8> {
    let mut window = EnvelopeWindow::new();
    transport.read(window.as_mut_bytes())?;

    let mut skipped = 0usize;
    while !window.is_aligned() {
        transport.read(window.shift())?;
        skipped += 1;
    }
    if skipped > 0 {
        log::trace!("Skipped {} stray bytes before envelope", skipped);
    }

    if debug {
        log::debug!("Command returned: {}", hexdump(window.as_bytes()));
    }

    let payload = window.payload();
    if expected != Command::QueryMode && payload != expected.as_byte() {
        return Err(Error::ProtocolMismatch(payload));
    }
    Ok(payload)
}

/// Read the framed version string
///
/// The reply carries no length, so this waits for the device to finish
/// sending, then takes whatever is buffered and cuts out the part between
/// the two `0xF7` markers.
pub fn read_version_response<T: Transport + ?Sized>(transport: &mut T) -> Result<Vec<u8>> {
    transport.delay(VERSION_SETTLE_DELAY);

    let count = transport.bytes_to_read()?;
    let mut buffered = vec![0u8; count];
    transport.read(&mut buffered)?;
    log::trace!("Version reply: {}", hexdump(&buffered));

    extract_version_payload(&buffered).map(<[u8]>::to_vec)
}

/// Send `command` and read the reply shape that belongs to it
pub fn dispatch<T: Transport + ?Sized>(
    transport: &mut T,
    command: Command,
    debug: bool,
) -> Result<Response> {
    send_frame(transport, command, debug)?;

    match command {
        // The programmer resets its serial endpoint, a read would hang
        Command::ResetProgrammer => Ok(Response::None),
        Command::GetVersion => read_version_response(transport).map(Response::Version),
        _ => read_simple_response(transport, command, debug).map(Response::Byte),
    }
}
