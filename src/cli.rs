//! CLI argument parsing

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, Parser};
use mysmartusb_core::Mode;

/// Parse a power state: true/on/yes, false/off/no or an integer (non-zero = on)
fn parse_power(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| format!("Invalid power state: {}", s)),
    }
}

/// Parse a mode letter (p, d or q)
fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse()
}

#[derive(Parser, Debug)]
#[command(name = "mysmartusb")]
#[command(author, about = "Control a MySmartUSB programmer", long_about = None)]
pub struct Cli {
    /// Reset the board
    #[arg(
        short = 'r',
        long = "reset-board",
        action = ArgAction::Append,
        num_args = 0,
        default_missing_value = "true"
    )]
    pub reset_board: Vec<bool>,

    /// Reset the programmer
    #[arg(
        short = 'R',
        long = "reset-prog",
        action = ArgAction::Append,
        num_args = 0,
        default_missing_value = "true"
    )]
    pub reset_prog: Vec<bool>,

    /// Turn board power on/off
    #[arg(short = 'p', long = "power", value_name = "1/0", value_parser = parse_power, action = ArgAction::Append)]
    pub power: Vec<bool>,

    /// Enter progmode/datamode/quietmode
    #[arg(short = 'm', long = "mode", value_name = "p/d/q", value_parser = parse_mode, action = ArgAction::Append)]
    pub mode: Vec<Mode>,

    /// Read and display the mysmartusb version
    #[arg(
        short = 'V',
        long = "getversion",
        action = ArgAction::Append,
        num_args = 0,
        default_missing_value = "true"
    )]
    pub get_version: Vec<bool>,

    /// Enable debugging
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Serial device of the programmer (e.g. /dev/ttyUSB0)
    #[arg(value_name = "DEVICE")]
    pub device: String,
}

/// One step of the action sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ResetBoard,
    ResetProgrammer,
    Power(bool),
    Mode(Mode),
    GetVersion,
}

impl Cli {
    /// Actions in the order they were given on the command line
    pub fn actions(&self, matches: &ArgMatches) -> Vec<Action> {
        let mut indexed = Vec::new();

        let flags = [
            ("reset_board", &self.reset_board, Action::ResetBoard),
            ("reset_prog", &self.reset_prog, Action::ResetProgrammer),
            ("get_version", &self.get_version, Action::GetVersion),
        ];
        for (id, values, action) in flags {
            for (index, enabled) in indices(matches, id).zip(values) {
                if *enabled {
                    indexed.push((index, action));
                }
            }
        }

        for (index, on) in indices(matches, "power").zip(&self.power) {
            indexed.push((index, Action::Power(*on)));
        }
        for (index, mode) in indices(matches, "mode").zip(&self.mode) {
            indexed.push((index, Action::Mode(*mode)));
        }

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, action)| action).collect()
    }
}

/// Command-line positions of an argument's values
fn indices<'a>(matches: &'a ArgMatches, id: &str) -> impl Iterator<Item = usize> + 'a {
    let given = matches.value_source(id) == Some(ValueSource::CommandLine);
    given
        .then(|| matches.indices_of(id))
        .flatten()
        .into_iter()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::{CommandFactory, FromArgMatches};

    fn parse(args: &[&str]) -> Result<(Cli, Vec<Action>), clap::Error> {
        let matches = Cli::command().try_get_matches_from(args)?;
        let cli = Cli::from_arg_matches(&matches)?;
        let actions = cli.actions(&matches);
        Ok((cli, actions))
    }

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_power() {
        for on in ["1", "true", "ON", "yes", "42"] {
            assert_eq!(parse_power(on), Ok(true), "{}", on);
        }
        for off in ["0", "false", "Off", "NO"] {
            assert_eq!(parse_power(off), Ok(false), "{}", off);
        }
        assert!(parse_power("maybe").is_err());
    }

    #[test]
    fn test_actions_in_command_line_order() {
        let (cli, actions) = parse(&[
            "mysmartusb",
            "-p",
            "1",
            "-m",
            "p",
            "-r",
            "--power=off",
            "-V",
            "/dev/ttyUSB0",
        ])
        .unwrap();

        assert_eq!(cli.device, "/dev/ttyUSB0");
        assert!(!cli.debug);
        assert_eq!(
            actions,
            vec![
                Action::Power(true),
                Action::Mode(Mode::Prog),
                Action::ResetBoard,
                Action::Power(false),
                Action::GetVersion,
            ]
        );
    }

    #[test]
    fn test_repeated_flags() {
        let (_, actions) = parse(&["mysmartusb", "-r", "-R", "-r", "-D", "/dev/ttyACM0"]).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::ResetBoard,
                Action::ResetProgrammer,
                Action::ResetBoard
            ]
        );
    }

    #[test]
    fn test_action_flags_take_no_value() {
        let err = parse(&["mysmartusb", "-r=false", "/dev/ttyUSB0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        assert!(parse(&["mysmartusb", "--getversion=false", "/dev/ttyUSB0"]).is_err());

        let help = Cli::command().render_help().to_string();
        assert!(help.contains("-r, --reset-board"));
        assert!(!help.contains("BOOL"));
    }

    #[test]
    fn test_combined_short_flags() {
        let (_, actions) = parse(&["mysmartusb", "-rRV", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::ResetBoard,
                Action::ResetProgrammer,
                Action::GetVersion
            ]
        );
    }

    #[test]
    fn test_device_after_flag() {
        let (cli, actions) = parse(&["mysmartusb", "--reset-prog", "/dev/ttyUSB1"]).unwrap();
        assert_eq!(cli.device, "/dev/ttyUSB1");
        assert_eq!(actions, vec![Action::ResetProgrammer]);
    }

    #[test]
    fn test_no_actions() {
        let (cli, actions) = parse(&["mysmartusb", "-D", "/dev/ttyUSB0"]).unwrap();
        assert!(cli.debug);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_mode_letters() {
        let (_, actions) = parse(&["mysmartusb", "-m", "D", "--mode", "q", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(actions, vec![Action::Mode(Mode::Data), Action::Mode(Mode::Quiet)]);

        let err = parse(&["mysmartusb", "-m", "x", "/dev/ttyUSB0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("Invalid mode: x"));
    }

    #[test]
    fn test_device_path_required() {
        let err = parse(&["mysmartusb", "-r"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());

        let err = parse(&["mysmartusb", "/dev/ttyUSB0", "/dev/ttyUSB1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help() {
        let err = parse(&["mysmartusb", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }
}
