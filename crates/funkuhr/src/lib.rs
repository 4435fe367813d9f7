//! # funkuhr: DCF77 time-signal decoding
//!
//! This crate decodes the [DCF77](https://en.wikipedia.org/wiki/DCF77)
//! longwave time signal — one amplitude-modulated bit per second, 59
//! data bits plus a minute-marker second, encoding BCD date/time with
//! parity — into calendar time for a standalone clock.
//!
//! The input is not audio: a hardware receiver module has already
//! turned the carrier reductions into signal edges. This crate takes
//! the *timing* of those edges and does everything after that:
//!
//! 1. [`EdgeClassifier`] maps one inter-edge duration to a
//!    [`BitSymbol`] (data bit, minute boundary, or noise).
//! 2. [`FrameAssembler`] accumulates symbols into an aligned 60-slot
//!    [`Frame`], driving the [`AcquisitionState`] machine.
//! 3. At each minute boundary, [`decode_frame()`] validates the frame
//!    (marker bits, even parity) and produces a [`CalendarTime`].
//! 4. [`FallbackClock`] keeps the calendar ticking from a free-running
//!    one-second counter whenever reception is lost, reseeded by every
//!    successful decode.
//!
//! [`DcfReceiver`] composes the whole chain. Hardware notifiers — the
//! edge detector and the periodic ticker — call into its lock-free
//! [`TimingPort`] from interrupt context; the main loop calls
//! [`poll()`](DcfReceiver::poll) and renders
//! [`status()`](DcfReceiver::status).
//!
//! ```
//! use funkuhr::{DcfReceiver, FrameOut, TimeDisplay};
//!
//! let mut rx = DcfReceiver::new();
//! let port = rx.port();
//!
//! // the hardware timing layer reports a ~1.9 s gap: minute boundary
//! port.on_edge(1900);
//! assert_eq!(rx.poll(), Some(FrameOut::Synced));
//!
//! // no decode yet, so no displayable time either
//! assert_eq!(rx.status().time, TimeDisplay::Unavailable);
//! ```
//!
//! Every error here is non-fatal and self-healing: noise and failed
//! frame validation regress the acquisition state and realign at the
//! next boundary marker; nothing terminates and nothing is escalated
//! beyond [`SignalStats`] and the acquisition state.

mod fallback;
mod framing;
mod receiver;
mod stats;
mod symbol;
mod timecode;

pub use fallback::FallbackClock;
pub use framing::{AcquisitionState, Frame, FrameAssembler, FrameOut, Slot, FRAME_LEN, SYNC_SLOT};
pub use receiver::{ClockStatus, DcfReceiver, TimeDisplay, TimingPort};
pub use stats::SignalStats;
pub use symbol::{BitSymbol, EdgeClassifier};
pub use timecode::{decode_frame, CalendarTime, TimecodeErr};
