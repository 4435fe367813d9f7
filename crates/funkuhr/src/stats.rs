//! Reception quality statistics

use std::fmt;

use crate::symbol::BitSymbol;

/// Lifetime reception counters and derived ratios
///
/// All four counters are monotonically non-decreasing for the life of
/// the process. Edges are counted as they are classified; seconds are
/// attributed to signal or fallback operation as they elapse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalStats {
    total_edges: u64,
    invalid_edges: u64,
    seconds_on_signal: u64,
    seconds_on_fallback: u64,
}

impl SignalStats {
    /// New, all-zero counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime count of classified edges
    pub fn total_edges(&self) -> u64 {
        self.total_edges
    }

    /// Lifetime count of edges classified as noise
    pub fn invalid_edges(&self) -> u64 {
        self.invalid_edges
    }

    /// Seconds spent displaying live signal time
    pub fn seconds_on_signal(&self) -> u64 {
        self.seconds_on_signal
    }

    /// Seconds spent displaying fallback time
    pub fn seconds_on_fallback(&self) -> u64 {
        self.seconds_on_fallback
    }

    /// Fraction of classified edges which were noise, in [0, 1]
    ///
    /// Zero until the first edge arrives.
    pub fn edge_error_rate(&self) -> f64 {
        if self.total_edges == 0 {
            0.0
        } else {
            self.invalid_edges as f64 / self.total_edges as f64
        }
    }

    /// Fraction of display seconds spent on live signal, in [0, 1]
    ///
    /// Zero until a second has been attributed either way.
    pub fn signal_uptime_ratio(&self) -> f64 {
        let total = self.seconds_on_signal + self.seconds_on_fallback;
        if total == 0 {
            0.0
        } else {
            self.seconds_on_signal as f64 / total as f64
        }
    }

    pub(crate) fn record_edge(&mut self, symbol: BitSymbol) {
        self.total_edges += 1;
        if symbol.is_noise() {
            self.invalid_edges += 1;
        }
    }

    pub(crate) fn record_signal_second(&mut self) {
        self.seconds_on_signal += 1;
    }

    pub(crate) fn record_fallback_second(&mut self) {
        self.seconds_on_fallback += 1;
    }
}

impl fmt::Display for SignalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error rate: {:5.2} %, uptime: {:5.2} %",
            100.0 * self.edge_error_rate(),
            100.0 * self.signal_uptime_ratio()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_empty_rates_are_zero() {
        let stats = SignalStats::new();
        assert_approx_eq!(stats.edge_error_rate(), 0.0);
        assert_approx_eq!(stats.signal_uptime_ratio(), 0.0);
    }

    #[test]
    fn test_edge_error_rate() {
        let mut stats = SignalStats::new();
        for _ in 0..3 {
            stats.record_edge(BitSymbol::Zero);
        }
        stats.record_edge(BitSymbol::Noise);
        assert_eq!(stats.total_edges(), 4);
        assert_eq!(stats.invalid_edges(), 1);
        assert_approx_eq!(stats.edge_error_rate(), 0.25);
    }

    #[test]
    fn test_uptime_ratio() {
        let mut stats = SignalStats::new();
        stats.record_signal_second();
        stats.record_signal_second();
        stats.record_signal_second();
        stats.record_fallback_second();
        assert_approx_eq!(stats.signal_uptime_ratio(), 0.75);
    }

    #[test]
    fn test_counters_stay_consistent() {
        let mut stats = SignalStats::new();
        let symbols = [
            BitSymbol::Zero,
            BitSymbol::Noise,
            BitSymbol::One,
            BitSymbol::SyncZero,
            BitSymbol::Noise,
            BitSymbol::SyncOne,
        ];
        for symbol in symbols {
            stats.record_edge(symbol);
            assert!(stats.total_edges() >= stats.invalid_edges());
            let rate = stats.edge_error_rate();
            assert!((0.0..=1.0).contains(&rate));
        }
        assert_eq!(stats.invalid_edges(), 2);
    }

    #[test]
    fn test_display_percentages() {
        let mut stats = SignalStats::new();
        stats.record_edge(BitSymbol::Noise);
        stats.record_edge(BitSymbol::Zero);
        stats.record_signal_second();
        assert_eq!(
            format!("{}", stats),
            "error rate: 50.00 %, uptime: 100.00 %"
        );
    }
}
