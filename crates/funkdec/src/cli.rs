use std::fmt::Display;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts DCF77 edge timings — one inter-edge duration in milliseconds per line — and decodes the time code they carry. Decoded times and per-second clock lines are printed to standard output.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts DCF77 edge timings — one inter-edge duration in milliseconds per line — and decodes the time code they carry. Decoded times and per-second clock lines are printed to standard output.

The input is what a receiver module's edge detector would report: ~800 ms and ~900 ms gaps for data bits, ~1800/1900 ms for the minute marker, anything else is noise. Blank lines and lines starting with '#' are ignored.

Pipe in a recorded capture:

    funkdec --file capture.txt

or generate timings and pipe them in:

    my-edge-logger /dev/ttyUSB0 | funkdec

Each simulated second prints one clock line. Lines are marked [dcf77] while the decoder is tracking the live signal and [timer] while it free-runs from the last decoded time.
"#;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded times
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    ///
    /// One edge duration in milliseconds per line.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Edge classification tolerance (ms, <50)
    ///
    /// Width of the window around each nominal gap duration. Widen
    /// this for receivers with a sloppy local oscillator.
    #[arg(long, default_value_t = 40)]
    #[arg(value_parser = value_parser!(u32).range(1..50))]
    pub tolerance: u32,

    /// Print per-edge classification lines (the diagnostic view)
    #[arg(short, long)]
    pub edges: bool,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["funkdec"]).expect("parse");
        assert!(args.input_is_stdin());
        assert_eq!(args.tolerance, 40);
        assert!(!args.edges);
    }

    #[test]
    fn test_tolerance_range() {
        assert!(Args::try_parse_from(["funkdec", "--tolerance", "50"]).is_err());
        assert!(Args::try_parse_from(["funkdec", "--tolerance", "0"]).is_err());
        let args = Args::try_parse_from(["funkdec", "--tolerance", "25"]).expect("parse");
        assert_eq!(args.tolerance, 25);
    }
}
