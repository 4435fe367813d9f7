//! Replay loop
//!
//! Drives a [`DcfReceiver`] from recorded edge timings. Real hardware
//! has two asynchronous notifiers — the edge detector and a periodic
//! ticker — preempting a polling main loop. The replay collapses that
//! into one deterministic loop: for each recorded duration it advances
//! the simulated millisecond and second ticks by that amount, latches
//! the edge, and polls, exactly as wall-clock time would have
//! interleaved them.

use log::debug;

use funkuhr::{AcquisitionState, DcfReceiver, FrameOut};

use crate::cli::Args;

/// Run the replay loop
///
/// `durations` yields one inter-edge duration (ms) per detected edge.
/// Prints decoded times and per-second clock lines to stdout unless
/// `--quiet`; per-edge classification lines are gated on `--edges`.
/// Returns the number of edges replayed.
pub fn run<I>(args: &Args, rx: &mut DcfReceiver, durations: I) -> u64
where
    I: Iterator<Item = u32>,
{
    let port = rx.port();
    let mut leftover_ms: u64 = 0;
    let mut edges: u64 = 0;

    for duration_ms in durations {
        // advance simulated time across this gap
        for _ in 0..duration_ms {
            port.on_millisecond_tick();
        }
        leftover_ms += u64::from(duration_ms);
        while leftover_ms >= 1000 {
            leftover_ms -= 1000;
            port.on_second_tick();
            print_clock_line(args, rx);
        }

        port.on_edge(duration_ms);
        edges += 1;

        match rx.poll() {
            Some(FrameOut::Ready(result)) => {
                if !args.quiet {
                    match result {
                        Ok(time) => println!("decoded: {}", time),
                        Err(err) => println!("rejected frame: {}", err),
                    }
                }
            }
            Some(out) => debug!("edge {:>4} ms: {}", duration_ms, out),
            None => {}
        }

        if args.edges && !args.quiet {
            if let Some((symbol, duration_ms)) = rx.status().last_edge {
                println!("edge: {:>4} ms  {}", duration_ms, symbol);
            }
        }
    }

    if !args.quiet {
        println!("{}", rx.stats());
    }
    edges
}

// One line per simulated second: what the clock face would show
fn print_clock_line(args: &Args, rx: &DcfReceiver) {
    if args.quiet {
        return;
    }
    let status = rx.status();
    match status.state {
        AcquisitionState::Operating => println!("{}", status.time),
        _ => match status.time.time() {
            Some(_) => println!("{}", status.time),
            None => println!("{} (bit {})", status.state, status.bit_slot),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    fn quiet_args() -> Args {
        Args::try_parse_from(["funkdec", "--quiet"]).expect("parse")
    }

    #[test]
    fn test_replay_counts_edges() {
        let args = quiet_args();
        let mut rx = DcfReceiver::new();
        let n = run(&args, &mut rx, [1900u32, 900, 800, 50].into_iter());
        assert_eq!(n, 4);
        assert_eq!(rx.stats().total_edges(), 4);
        assert_eq!(rx.stats().invalid_edges(), 1);
    }

    #[test]
    fn test_replay_advances_simulated_clock() {
        let args = quiet_args();
        let mut rx = DcfReceiver::new();
        // 5 edges x 900 ms = 4.5 simulated seconds; no decode has
        // happened, so none of them are attributed to either mode
        run(&args, &mut rx, std::iter::repeat(900u32).take(5));
        assert_eq!(rx.stats().seconds_on_signal(), 0);
        assert_eq!(rx.stats().seconds_on_fallback(), 0);
        // data bits alone never align the frame
        assert_eq!(rx.state(), AcquisitionState::WaitForSync);
    }
}
