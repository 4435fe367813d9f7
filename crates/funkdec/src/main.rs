use std::io;
use std::io::BufRead;

use anyhow::Context;
use clap::Parser;
use log::{info, warn, LevelFilter};

use funkuhr::{DcfReceiver, EdgeClassifier};

mod app;
mod cli;

use cli::{Args, CliError};

fn main() {
    match funkdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn funkdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder
    let mut rx = DcfReceiver::with_classifier(EdgeClassifier::with_tolerance_ms(args.tolerance));

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    // processing: read one duration per line
    let edges = app::run(&args, &mut rx, durations(inbuf));
    info!("replayed {} edges; {}", edges, rx.stats());

    Ok(())
}

// Parse edge durations, skipping blank lines and '#' comments.
// Unparseable lines are reported and dropped; a garbled capture line
// should not abort the replay.
fn durations<R>(input: R) -> impl Iterator<Item = u32>
where
    R: BufRead,
{
    input
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| match line.split('#').next().unwrap_or("").trim() {
            "" => None,
            text => match text.parse::<u32>() {
                Ok(duration_ms) => Some(duration_ms),
                Err(_) => {
                    warn!("skipping unparseable input line: \"{}\"", line);
                    None
                }
            },
        })
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("funkuhr", log_filter)
            .filter_module("funkdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("decoder reading edge timings from standard input");
        Ok(Box::new(io::BufReader::new(stdin)))
    } else {
        info!("decoder reading edge timings from: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_parser() {
        let input = "900\n\n# comment\n 800 \n1900 # minute mark\nbogus\n50\n";
        let out: Vec<u32> = durations(io::Cursor::new(input)).collect();
        assert_eq!(out, vec![900, 800, 1900, 50]);
    }
}
