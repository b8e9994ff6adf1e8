//! mysmartusb - MySmartUSB programmer control
//!
//! Resets the target board or the programmer, switches board power, selects
//! the programmer mode and reads the firmware version over the programmer's
//! serial port.
//!
//! Actions run in the order they are given on the command line:
//!
//! ```text
//! mysmartusb -p 1 -m p -r /dev/ttyUSB0
//! ```

mod cli;
mod commands;

use clap::{CommandFactory, FromArgMatches};
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Malformed arguments are rejected before any device is opened
    let matches = match Cli::command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => return usage_exit(e),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => return usage_exit(e),
    };

    // Initialize logger, -D enables frame dumps
    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let actions = cli.actions(&matches);
    log::debug!("Actions: {:?}", actions);

    let result = mysmartusb_core::open_serial(&cli.device, cli.debug)
        .and_then(|msu| commands::run_actions(msu, &actions));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Print a clap error or the help text and pick the exit code
///
/// Help exits with 0, every argument error with 1.
fn usage_exit(e: clap::Error) -> ExitCode {
    // Nothing left to report to if the terminal write fails
    e.print().ok();
    if e.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
