//! Full receiver chain and hardware notifier surface

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

#[cfg(not(test))]
use log::{debug, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as warn;

use crate::fallback::FallbackClock;
use crate::framing::{AcquisitionState, FrameAssembler, FrameOut};
use crate::stats::SignalStats;
use crate::symbol::{BitSymbol, EdgeClassifier};
use crate::timecode::CalendarTime;

/// Shared surface for the asynchronous hardware notifiers
///
/// The radio edge detector and the periodic ticker fire outside the
/// main control flow and may preempt it at any point, so every field
/// they touch is a single word updated atomically, with a single
/// writer per field and no lock:
///
/// * `accum_ms` — written by [`on_millisecond_tick()`](Self::on_millisecond_tick)
///   while a second elapses; zeroed by [`on_edge()`](Self::on_edge).
///   Non-zero means "still accumulating."
/// * `edge_ms` — the latched duration of the most recent edge. Zero is
///   the "no edge yet" sentinel, which is why a true duration of zero
///   is never latched. The polling loop consumes the latch with a
///   swap, so one edge is never classified twice.
/// * `epoch` — the free-running second counter, advanced by
///   [`on_second_tick()`](Self::on_second_tick) and overwritten when a
///   decode reseeds the clock.
///
/// All three notifier entry points are bounded, branch-light, and
/// allocation-free.
#[derive(Debug, Default)]
pub struct TimingPort {
    accum_ms: AtomicU32,
    edge_ms: AtomicU32,
    epoch: AtomicI64,
}

impl TimingPort {
    fn new() -> Self {
        Self::default()
    }

    /// Millisecond tick: advance the inter-edge duration measurement
    pub fn on_millisecond_tick(&self) {
        self.accum_ms.fetch_add(1, Ordering::Relaxed);
    }

    /// Edge detected: latch its measured duration for the poll loop
    ///
    /// A `duration_ms` of zero means "no edge yet" and is ignored.
    pub fn on_edge(&self, duration_ms: u32) {
        if duration_ms == 0 {
            return;
        }
        self.accum_ms.store(0, Ordering::Relaxed);
        self.edge_ms.store(duration_ms, Ordering::Release);
    }

    /// Second tick: advance the free-running epoch counter
    pub fn on_second_tick(&self) {
        self.epoch.fetch_add(1, Ordering::Relaxed);
    }

    /// Milliseconds accumulated since the last detected edge
    pub fn millis_since_edge(&self) -> u32 {
        self.accum_ms.load(Ordering::Relaxed)
    }

    fn take_edge(&self) -> Option<u32> {
        match self.edge_ms.swap(0, Ordering::Acquire) {
            0 => None,
            duration_ms => Some(duration_ms),
        }
    }

    fn epoch_seconds(&self) -> i64 {
        self.epoch.load(Ordering::Relaxed)
    }

    fn reseed(&self, epoch_seconds: i64) {
        self.epoch.store(epoch_seconds, Ordering::Relaxed);
    }
}

/// The currently displayable time
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeDisplay {
    /// Live signal: the most recently decoded time, seconds tracking
    /// the frame cursor
    Live(CalendarTime),

    /// No usable signal; time derived from the free-running counter
    Fallback(CalendarTime),

    /// No successful decode has ever occurred; no time is derivable
    Unavailable,
}

impl TimeDisplay {
    /// The displayable time, if there is one
    pub fn time(&self) -> Option<&CalendarTime> {
        match self {
            TimeDisplay::Live(time) | TimeDisplay::Fallback(time) => Some(time),
            TimeDisplay::Unavailable => None,
        }
    }

    /// True when the time comes directly from the radio signal
    pub fn is_live(&self) -> bool {
        matches!(self, TimeDisplay::Live(_))
    }
}

impl fmt::Display for TimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeDisplay::Live(time) => write!(f, "{} [dcf77]", time),
            TimeDisplay::Fallback(time) => write!(f, "{} [timer]", time),
            TimeDisplay::Unavailable => write!(f, "--:--:--"),
        }
    }
}

/// Snapshot of everything the display needs, refreshed on demand
#[derive(Clone, Debug)]
pub struct ClockStatus {
    /// Current acquisition state
    pub state: AcquisitionState,

    /// Most recent classified edge and its raw duration (ms), for the
    /// diagnostic view
    pub last_edge: Option<(BitSymbol, u32)>,

    /// Bit slot the assembler will fill next
    pub bit_slot: u8,

    /// The current displayable time
    pub time: TimeDisplay,

    /// Reception statistics
    pub stats: SignalStats,
}

/// A complete DCF77 receiver chain
///
/// The receiver consumes edge-duration measurements and periodic ticks
/// through its [`TimingPort`] and performs the following operations:
///
/// 1. Edge classification into [`BitSymbol`]s
/// 2. Frame assembly and minute-boundary alignment
/// 3. Time-code validation and calendar decoding
/// 4. Fallback timekeeping when reception is lost
///
/// The main control loop calls [`poll()`](Self::poll) as often as it
/// likes; each call consumes at most one latched edge. There is no
/// cancellation and no timeout: reception loss simply regresses the
/// acquisition state, and the fixed-size frame is overwritten rather
/// than queued, so nothing can build up under continuous noise.
///
/// ```
/// use funkuhr::{DcfReceiver, FrameOut};
///
/// let mut rx = DcfReceiver::new();
/// let port = rx.port();
///
/// // hardware notifiers call into the port
/// port.on_edge(1900);
///
/// // the main loop polls
/// match rx.poll() {
///     Some(FrameOut::Synced) => println!("aligned to minute boundary"),
///     Some(evt) => println!("{}", evt),
///     None => {}
/// }
/// ```
#[derive(Debug)]
pub struct DcfReceiver {
    port: Arc<TimingPort>,
    classifier: EdgeClassifier,
    assembler: FrameAssembler,
    fallback: FallbackClock,
    stats: SignalStats,
    last_edge: Option<(BitSymbol, u32)>,
    last_decoded: Option<CalendarTime>,
    seen_epoch: i64,
}

impl DcfReceiver {
    /// New receiver with the default classification tolerance
    pub fn new() -> Self {
        Self::with_classifier(EdgeClassifier::new())
    }

    /// New receiver with a custom edge classifier
    pub fn with_classifier(classifier: EdgeClassifier) -> Self {
        Self {
            port: Arc::new(TimingPort::new()),
            classifier,
            assembler: FrameAssembler::new(),
            fallback: FallbackClock::new(),
            stats: SignalStats::new(),
            last_edge: None,
            last_decoded: None,
            seen_epoch: 0,
        }
    }

    /// Handle to the hardware notifier surface
    ///
    /// Clone-cheap; hand one to each notifier.
    pub fn port(&self) -> Arc<TimingPort> {
        Arc::clone(&self.port)
    }

    /// Current acquisition state
    pub fn state(&self) -> AcquisitionState {
        self.assembler.state()
    }

    /// Reception statistics
    pub fn stats(&self) -> &SignalStats {
        &self.stats
    }

    /// One main-loop step
    ///
    /// Attributes any seconds that elapsed since the previous call,
    /// then consumes the latched edge, if one is pending: classifies
    /// it, feeds the assembler, and on a successfully decoded frame
    /// reseeds the fallback clock. Returns the assembler output for a
    /// consumed edge, or `None` when no edge was pending.
    pub fn poll(&mut self) -> Option<FrameOut> {
        self.account_seconds();

        let duration_ms = self.port.take_edge()?;
        let symbol = self.classifier.classify(duration_ms);
        debug!("receiver: edge {} ms -> {}", duration_ms, symbol);
        self.last_edge = Some((symbol, duration_ms));
        self.stats.record_edge(symbol);

        let out = self.assembler.input(symbol);
        if let FrameOut::Ready(Ok(time)) = &out {
            // validated at decode; failure here would mean the
            // decoder let an impossible date through
            match self.fallback.seed(time) {
                Ok(epoch) => {
                    self.port.reseed(epoch);
                    self.seen_epoch = epoch;
                    self.last_decoded = Some(time.clone());
                }
                Err(err) => warn!("receiver: refusing reseed: {}", err),
            }
        }
        Some(out)
    }

    /// Build a display snapshot
    ///
    /// While `Operating`, the time is the most recent decode with the
    /// second tracking the bit cursor. Otherwise the time derives
    /// from the free-running counter, or is unavailable if no decode
    /// has ever succeeded.
    pub fn status(&self) -> ClockStatus {
        let state = self.assembler.state();
        let time = match (state, &self.last_decoded) {
            (AcquisitionState::Operating, Some(decoded)) => {
                let mut time = decoded.clone();
                time.second = self.assembler.cursor();
                TimeDisplay::Live(time)
            }
            _ => match self.fallback.derive(self.port.epoch_seconds()) {
                Some(time) => TimeDisplay::Fallback(time),
                None => TimeDisplay::Unavailable,
            },
        };

        ClockStatus {
            state,
            last_edge: self.last_edge,
            bit_slot: self.assembler.cursor(),
            time,
            stats: self.stats,
        }
    }

    /// Discard acquisition progress and wait for a fresh boundary
    ///
    /// Statistics and the seeded fallback clock survive a reset.
    pub fn reset(&mut self) {
        self.assembler.reset();
        self.last_edge = None;
    }

    // Attribute elapsed seconds to signal or fallback operation
    fn account_seconds(&mut self) {
        let now = self.port.epoch_seconds();
        while self.seen_epoch < now {
            self.seen_epoch += 1;
            if self.assembler.state() == AcquisitionState::Operating {
                self.stats.record_signal_second();
            } else if self.fallback.is_seeded() {
                self.stats.record_fallback_second();
            }
        }
    }
}

impl Default for DcfReceiver {
    fn default() -> Self {
        Self::new()
    }
}
