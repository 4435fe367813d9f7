//! Edge-timing classification

/// One classified inter-edge duration
///
/// The DCF77 carrier is reduced for ~100 ms (bit `0`) or ~200 ms
/// (bit `1`) once per second. Measured from one falling edge to the
/// next, a data second therefore spans ~900 ms or ~800 ms. The minute
/// marker is the one second in which no reduction occurs, which makes
/// the gap roughly double the normal cycle: ~1900 ms or ~1800 ms,
/// depending on the value of the final data bit before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum BitSymbol {
    /// Data bit `0` (~900 ms gap)
    #[strum(serialize = "0")]
    Zero,

    /// Data bit `1` (~800 ms gap)
    #[strum(serialize = "1")]
    One,

    /// Minute boundary, carrying data bit `0` (~1900 ms gap)
    #[strum(serialize = "sync/0")]
    SyncZero,

    /// Minute boundary, carrying data bit `1` (~1800 ms gap)
    #[strum(serialize = "sync/1")]
    SyncOne,

    /// Duration outside every window; not a usable bit
    #[strum(serialize = "noise")]
    Noise,
}

impl BitSymbol {
    /// Data bit value carried by this symbol, if any
    pub fn bit(&self) -> Option<bool> {
        match self {
            BitSymbol::Zero | BitSymbol::SyncZero => Some(false),
            BitSymbol::One | BitSymbol::SyncOne => Some(true),
            BitSymbol::Noise => None,
        }
    }

    /// True if this symbol marks a minute boundary
    pub fn is_sync(&self) -> bool {
        matches!(self, BitSymbol::SyncZero | BitSymbol::SyncOne)
    }

    /// True if this symbol is unusable noise
    pub fn is_noise(&self) -> bool {
        matches!(self, BitSymbol::Noise)
    }
}

/// Maps a measured inter-edge duration to a [`BitSymbol`]
///
/// Classification uses four non-overlapping open intervals centered
/// on the nominal durations, each ± [`tolerance_ms`](Self::tolerance_ms)
/// wide. The tolerance compensates for receiver jitter and local
/// oscillator drift. Anything outside all four windows — including a
/// duration of zero, which means "no edge yet" — is [`BitSymbol::Noise`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeClassifier {
    tolerance_ms: u32,
}

impl EdgeClassifier {
    /// Nominal gap for data bit `1`, in milliseconds
    pub const NOMINAL_ONE_MS: u32 = 800;

    /// Nominal gap for data bit `0`, in milliseconds
    pub const NOMINAL_ZERO_MS: u32 = 900;

    /// Nominal gap for a minute boundary after a `1` bit
    pub const NOMINAL_SYNC_ONE_MS: u32 = 1800;

    /// Nominal gap for a minute boundary after a `0` bit
    pub const NOMINAL_SYNC_ZERO_MS: u32 = 1900;

    /// Default classification tolerance, in milliseconds
    pub const DEFAULT_TOLERANCE_MS: u32 = 40;

    /// New classifier with the default ±40 ms tolerance
    pub fn new() -> Self {
        Self::with_tolerance_ms(Self::DEFAULT_TOLERANCE_MS)
    }

    /// New classifier with a custom tolerance
    ///
    /// `tolerance_ms` must be less than 50 ms, or the `One`/`Zero`
    /// and `SyncOne`/`SyncZero` windows would overlap. Larger values
    /// are clamped.
    pub fn with_tolerance_ms(tolerance_ms: u32) -> Self {
        Self {
            tolerance_ms: tolerance_ms.min(49),
        }
    }

    /// Configured tolerance, in milliseconds
    pub fn tolerance_ms(&self) -> u32 {
        self.tolerance_ms
    }

    /// Classify one inter-edge duration
    ///
    /// Total over all inputs: every duration maps to exactly one
    /// symbol, and durations outside all four windows map to
    /// [`BitSymbol::Noise`]. Window bounds are exclusive.
    pub fn classify(&self, duration_ms: u32) -> BitSymbol {
        if self.in_window(duration_ms, Self::NOMINAL_ONE_MS) {
            BitSymbol::One
        } else if self.in_window(duration_ms, Self::NOMINAL_ZERO_MS) {
            BitSymbol::Zero
        } else if self.in_window(duration_ms, Self::NOMINAL_SYNC_ONE_MS) {
            BitSymbol::SyncOne
        } else if self.in_window(duration_ms, Self::NOMINAL_SYNC_ZERO_MS) {
            BitSymbol::SyncZero
        } else {
            BitSymbol::Noise
        }
    }

    #[inline]
    fn in_window(&self, duration_ms: u32, nominal_ms: u32) -> bool {
        nominal_ms - self.tolerance_ms < duration_ms && duration_ms < nominal_ms + self.tolerance_ms
    }
}

impl Default for EdgeClassifier {
    fn default() -> Self {
        Self::new()
    }
}
