//! CLI command implementations
//!
//! Each [`Action`] parsed from the command line maps onto one operation of
//! the `MySmartUsb` device. Actions run in order and the first error aborts
//! the remaining sequence.

use crate::cli::Action;
use mysmartusb_core::{MySmartUsb, Result, Transport};

/// Run a single action against the device
pub fn run_action<T: Transport>(msu: &mut MySmartUsb<T>, action: Action) -> Result<()> {
    log::debug!("Running {:?}", action);
    match action {
        Action::ResetBoard => msu.reset_board(),
        Action::ResetProgrammer => msu.reset_programmer(),
        Action::Power(on) => msu.set_power(on),
        Action::Mode(mode) => msu.set_mode(mode),
        Action::GetVersion => {
            println!("{}", msu.get_version()?);
            Ok(())
        }
    }
}

/// Run all actions in order, then close the device
pub fn run_actions<T: Transport>(mut msu: MySmartUsb<T>, actions: &[Action]) -> Result<()> {
    for &action in actions {
        run_action(&mut msu, action)?;
    }
    msu.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysmartusb_core::protocol::{ENVELOPE_HEAD, ENVELOPE_TAIL, FRAME_LEN, PREFIX};
    use mysmartusb_core::{Error, Mode};
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Minimal programmer simulation answering frames like the real device
    struct SimulatedProgrammer {
        mode: u8,
        /// Mode switches the device ignores
        stuck: bool,
        output: VecDeque<u8>,
        commands: Vec<u8>,
    }

    impl SimulatedProgrammer {
        fn new(mode: Mode) -> Self {
            Self {
                mode: mode.as_byte(),
                stuck: false,
                output: VecDeque::new(),
                commands: Vec::new(),
            }
        }

        fn envelope(&mut self, payload: u8) {
            self.output.extend(ENVELOPE_HEAD);
            self.output.push_back(payload);
            self.output.extend(ENVELOPE_TAIL);
        }
    }

    impl Transport for SimulatedProgrammer {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            assert_eq!(data.len(), FRAME_LEN);
            assert_eq!(&data[..PREFIX.len()], &PREFIX);

            let cmd = data[PREFIX.len()];
            self.commands.push(cmd);
            match cmd {
                b'R' => {}
                b'v' => {
                    self.output.push_back(0xF7);
                    self.output.extend(b"MK2 v2.11");
                    self.output.push_back(0xF7);
                }
                b'i' => self.envelope(self.mode),
                b'p' | b'd' | b'q' => {
                    if !self.stuck {
                        self.mode = cmd;
                    }
                    self.envelope(cmd);
                }
                other => self.envelope(other),
            }
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            if self.output.len() < buf.len() {
                return Err(Error::Io("no reply pending".into()));
            }
            for slot in buf.iter_mut() {
                *slot = self.output.pop_front().unwrap_or_default();
            }
            Ok(())
        }

        fn bytes_to_read(&mut self) -> Result<usize> {
            Ok(self.output.len())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn delay(&mut self, _duration: Duration) {}
    }

    #[test]
    fn test_run_actions_in_order() {
        let mut sim = SimulatedProgrammer::new(Mode::Data);
        let actions = [
            Action::Power(true),
            Action::Mode(Mode::Prog),
            Action::ResetBoard,
            Action::GetVersion,
            Action::ResetProgrammer,
        ];

        run_actions(MySmartUsb::new(&mut sim, false), &actions).unwrap();

        assert_eq!(sim.commands, b"+ipirvR".to_vec());
        assert_eq!(sim.mode, b'p');
    }

    #[test]
    fn test_error_aborts_sequence() {
        let mut sim = SimulatedProgrammer::new(Mode::Quiet);
        sim.stuck = true;
        let actions = [Action::Mode(Mode::Data), Action::ResetBoard];

        let err = run_actions(MySmartUsb::new(&mut sim, true), &actions).unwrap_err();

        assert!(matches!(err, Error::ModeSwitchFailure { .. }));
        // The board reset never ran
        assert_eq!(sim.commands, b"idi".to_vec());
    }
}
