//! Minute-frame assembly and acquisition state

use std::fmt;

#[cfg(not(test))]
use log::{debug, info, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use crate::symbol::BitSymbol;
use crate::timecode::{decode_frame, CalendarTime, TimecodeErr};

/// Number of bit slots in one minute frame
pub const FRAME_LEN: usize = 60;

/// The slot reserved for the minute-boundary marker
pub const SYNC_SLOT: usize = FRAME_LEN - 1;

/// Contents of one frame slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Nothing has been stored here since the last realignment
    Undecided,

    /// A decoded data bit
    Bit(bool),

    /// The minute-boundary marker, carrying its data bit value
    Sync(bool),

    /// An unclassifiable edge landed here; the frame is abandoned
    Noise,
}

/// One minute's worth of classified bit slots
///
/// Slots 0..=58 hold the data bits of the DCF77 time code; slot 59 is
/// reserved for the boundary marker. Exactly one `Frame` exists per
/// assembler and is overwritten in place, once per minute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    slots: [Slot; FRAME_LEN],
}

impl Frame {
    /// New frame with every slot undecided
    pub fn new() -> Self {
        Self {
            slots: [Slot::Undecided; FRAME_LEN],
        }
    }

    /// Slot contents at `index`
    ///
    /// Panics if `index >= 60`.
    pub fn slot(&self, index: usize) -> Slot {
        self.slots[index]
    }

    /// Data bit stored at `index`, if one is present
    pub fn bit(&self, index: usize) -> Option<bool> {
        match self.slots[index] {
            Slot::Bit(bit) | Slot::Sync(bit) => Some(bit),
            Slot::Undecided | Slot::Noise => None,
        }
    }

    /// Store a data bit at `index`
    pub fn set_bit(&mut self, index: usize, bit: bool) {
        self.slots[index] = Slot::Bit(bit);
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal acquisition state
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumString,
)]
pub enum AcquisitionState {
    /// No aligned minute boundary has been observed yet
    #[strum(serialize = "waiting for sync")]
    WaitForSync,

    /// Aligned to a minute boundary; filling the first full frame
    #[strum(serialize = "decoding")]
    Decoding,

    /// At least one full, correctly-aligned frame has been observed
    #[strum(serialize = "operating")]
    Operating,
}

/// Assembler output for one input symbol
///
/// [`Ready`](FrameOut::Ready) is emitted at every minute boundary
/// observed while a full frame is available, carrying either the
/// decoded calendar time or the reason the frame was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOut {
    /// Noise discarded the in-progress frame; waiting for a boundary
    Searching,

    /// First minute boundary observed; the frame is now aligned
    Synced,

    /// A data bit was stored; the frame is still filling
    Reading,

    /// A full frame was completed and validated at a minute boundary
    Ready(Result<CalendarTime, TimecodeErr>),
}

impl FrameOut {
    /// Decoded calendar time, if this event carries one
    pub fn time(&self) -> Option<&CalendarTime> {
        match self {
            FrameOut::Ready(Ok(time)) => Some(time),
            _ => None,
        }
    }
}

impl AsRef<str> for FrameOut {
    fn as_ref(&self) -> &str {
        match self {
            FrameOut::Searching => "searching",
            FrameOut::Synced => "synced",
            FrameOut::Reading => "reading",
            FrameOut::Ready(Ok(_)) => "time",
            FrameOut::Ready(Err(_)) => "decode error",
        }
    }
}

impl fmt::Display for FrameOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameOut::Ready(Ok(time)) => write!(f, "{}: {}", self.as_ref(), time),
            FrameOut::Ready(Err(err)) => write!(f, "{}: {}", self.as_ref(), err),
            _ => write!(f, "{}", self.as_ref()),
        }
    }
}

/// Accumulates classified symbols into aligned 60-slot frames
///
/// The assembler owns the [`Frame`], the write cursor, and the
/// [`AcquisitionState`] machine. The cursor is forced to the boundary
/// slot on every sync or noise symbol, which self-corrects any prior
/// drift: alignment recovers from a burst of interference without
/// outside intervention. At each minute boundary observed while
/// `Operating` is reached, the completed frame is handed to
/// [`decode_frame`]; a rejected frame regresses the state machine to
/// [`WaitForSync`](AcquisitionState::WaitForSync), so re-acquisition
/// requires a fresh boundary marker.
#[derive(Clone, Debug)]
pub struct FrameAssembler {
    frame: Frame,
    cursor: usize,
    state: AcquisitionState,
}

impl FrameAssembler {
    /// New assembler, waiting for its first minute boundary
    pub fn new() -> Self {
        Self {
            frame: Frame::new(),
            cursor: 0,
            state: AcquisitionState::WaitForSync,
        }
    }

    /// Current acquisition state
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Current write cursor, 0..=59
    ///
    /// While `Operating`, this is also the second of the current
    /// minute: one data bit arrives per second.
    pub fn cursor(&self) -> u8 {
        self.cursor as u8
    }

    /// The frame being assembled
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Discard all progress and wait for a fresh boundary
    pub fn reset(&mut self) {
        self.frame = Frame::new();
        self.cursor = 0;
        self.state = AcquisitionState::WaitForSync;
    }

    /// Process one classified symbol
    pub fn input(&mut self, symbol: BitSymbol) -> FrameOut {
        match symbol {
            BitSymbol::Noise => {
                // abandon the in-progress frame and realign
                self.frame.slots[SYNC_SLOT] = Slot::Noise;
                self.cursor = 0;
                if self.state != AcquisitionState::WaitForSync {
                    debug!("framing: noise edge; alignment lost");
                }
                self.state = AcquisitionState::WaitForSync;
                FrameOut::Searching
            }

            BitSymbol::SyncZero | BitSymbol::SyncOne => {
                self.frame.slots[SYNC_SLOT] = Slot::Sync(symbol == BitSymbol::SyncOne);
                self.cursor = 0;
                match self.state {
                    AcquisitionState::WaitForSync => {
                        info!("framing: minute boundary found; aligned");
                        self.state = AcquisitionState::Decoding;
                        FrameOut::Synced
                    }
                    AcquisitionState::Decoding | AcquisitionState::Operating => {
                        self.state = AcquisitionState::Operating;
                        let result = decode_frame(&self.frame, self.cursor());
                        match &result {
                            Ok(time) => info!("framing: frame decoded: {}", time),
                            Err(err) => {
                                warn!("framing: frame rejected ({}); realigning", err);
                                self.state = AcquisitionState::WaitForSync;
                            }
                        }
                        FrameOut::Ready(result)
                    }
                }
            }

            BitSymbol::Zero | BitSymbol::One => {
                self.frame.slots[self.cursor] = Slot::Bit(symbol == BitSymbol::One);
                self.cursor = (self.cursor + 1) % FRAME_LEN;
                FrameOut::Reading
            }
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::encode_frame;

    fn sample_time() -> CalendarTime {
        // Saturday 2026-08-29 14:37:00 CEST
        CalendarTime {
            second: 0,
            minute: 37,
            hour: 14,
            day: 29,
            weekday: 6,
            month: 8,
            year: 26,
            summer_time: true,
        }
    }

    // Data-bit symbols for slots 0..=58 of the encoded frame
    fn frame_symbols(time: &CalendarTime) -> Vec<BitSymbol> {
        let frame = encode_frame(time);
        (0..SYNC_SLOT)
            .map(|i| match frame.bit(i) {
                Some(true) => BitSymbol::One,
                _ => BitSymbol::Zero,
            })
            .collect()
    }

    #[test]
    fn test_noise_keeps_waiting() {
        let mut asm = FrameAssembler::new();
        assert_eq!(asm.input(BitSymbol::Noise), FrameOut::Searching);
        assert_eq!(asm.state(), AcquisitionState::WaitForSync);
        assert_eq!(asm.cursor(), 0);
        assert_eq!(asm.frame().slot(SYNC_SLOT), Slot::Noise);
    }

    #[test]
    fn test_sync_then_noise_loses_alignment() {
        let mut asm = FrameAssembler::new();
        assert_eq!(asm.input(BitSymbol::SyncZero), FrameOut::Synced);
        assert_eq!(asm.state(), AcquisitionState::Decoding);
        assert_eq!(asm.input(BitSymbol::Noise), FrameOut::Searching);
        assert_eq!(asm.state(), AcquisitionState::WaitForSync);
    }

    #[test]
    fn test_two_syncs_reach_operating_but_empty_frame_rejects() {
        let mut asm = FrameAssembler::new();
        assert_eq!(asm.input(BitSymbol::SyncZero), FrameOut::Synced);

        // the second boundary completes a frame, but one with no data
        // bits, so validation fails and acquisition starts over
        match asm.input(BitSymbol::SyncOne) {
            FrameOut::Ready(Err(TimecodeErr::Incomplete)) => {}
            other => panic!("unexpected output {:?}", other),
        }
        assert_eq!(asm.state(), AcquisitionState::WaitForSync);
    }

    #[test]
    fn test_data_bits_advance_cursor() {
        let mut asm = FrameAssembler::new();
        asm.input(BitSymbol::SyncZero);
        assert_eq!(asm.input(BitSymbol::One), FrameOut::Reading);
        assert_eq!(asm.input(BitSymbol::Zero), FrameOut::Reading);
        assert_eq!(asm.cursor(), 2);
        assert_eq!(asm.frame().bit(0), Some(true));
        assert_eq!(asm.frame().bit(1), Some(false));
        assert_eq!(asm.state(), AcquisitionState::Decoding);
    }

    #[test]
    fn test_full_minute_decodes() {
        let time = sample_time();
        let mut asm = FrameAssembler::new();

        assert_eq!(asm.input(BitSymbol::SyncZero), FrameOut::Synced);
        for symbol in frame_symbols(&time) {
            assert_eq!(asm.input(symbol), FrameOut::Reading);
        }
        assert_eq!(asm.cursor(), 59);

        let out = asm.input(BitSymbol::SyncZero);
        assert_eq!(out.time(), Some(&time));
        assert_eq!(asm.state(), AcquisitionState::Operating);
        assert_eq!(asm.cursor(), 0);
    }

    #[test]
    fn test_corrupted_minute_regresses() {
        let time = sample_time();
        let mut symbols = frame_symbols(&time);

        // flip one bit inside the 36..=58 parity range
        symbols[40] = match symbols[40] {
            BitSymbol::One => BitSymbol::Zero,
            _ => BitSymbol::One,
        };

        let mut asm = FrameAssembler::new();
        asm.input(BitSymbol::SyncZero);
        for symbol in symbols {
            asm.input(symbol);
        }
        match asm.input(BitSymbol::SyncZero) {
            FrameOut::Ready(Err(TimecodeErr::Parity(36, 58))) => {}
            other => panic!("unexpected output {:?}", other),
        }
        assert_eq!(asm.state(), AcquisitionState::WaitForSync);
    }

    #[test]
    fn test_drift_self_corrects_at_boundary() {
        // extra data bits push the cursor past where the boundary
        // should be; the next sync still realigns to slot 0
        let mut asm = FrameAssembler::new();
        asm.input(BitSymbol::SyncZero);
        for _ in 0..70 {
            asm.input(BitSymbol::Zero);
        }
        assert_eq!(asm.cursor(), 70 % 60);
        asm.input(BitSymbol::SyncZero);
        assert_eq!(asm.cursor(), 0);
    }

    #[test]
    fn test_reset() {
        let mut asm = FrameAssembler::new();
        asm.input(BitSymbol::SyncZero);
        asm.input(BitSymbol::One);
        asm.reset();
        assert_eq!(asm.state(), AcquisitionState::WaitForSync);
        assert_eq!(asm.cursor(), 0);
        assert_eq!(asm.frame().bit(0), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            format!("{}", AcquisitionState::WaitForSync),
            "waiting for sync"
        );
        assert_eq!(format!("{}", AcquisitionState::Operating), "operating");
        assert_eq!(format!("{}", FrameOut::Searching), "searching");
    }
}
