//! Free-running fallback timekeeping

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

use crate::timecode::{CalendarTime, TimecodeErr};

/// Calendar derivation for the free-running second counter
///
/// The epoch counter itself lives in the
/// [`TimingPort`](crate::TimingPort), where the one-second hardware
/// notifier advances it. `FallbackClock` tracks whether that counter
/// has ever been seeded from a successful decode: before the first
/// seed the counter's value is meaningless and no calendar time can
/// be derived at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackClock {
    seeded: bool,
    summer_time: bool,
}

impl FallbackClock {
    /// New, never-seeded clock
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a successful decode has seeded the epoch
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Accept a freshly-decoded time; returns the epoch seconds to
    /// store in the hardware counter
    pub fn seed(&mut self, time: &CalendarTime) -> Result<i64, TimecodeErr> {
        let epoch = time.to_epoch_seconds()?;
        self.seeded = true;
        self.summer_time = time.summer_time;
        info!("fallback: reseeded from decoded time: {}", time);
        Ok(epoch)
    }

    /// Calendar time for the given epoch second count
    ///
    /// Returns `None` until the first seed. The summer-time flag is
    /// the one carried by the last successful decode: a DST
    /// transition that occurs while unsynced is not detected until
    /// the next decode.
    pub fn derive(&self, epoch_seconds: i64) -> Option<CalendarTime> {
        if !self.seeded {
            return None;
        }
        CalendarTime::from_epoch_seconds(epoch_seconds, self.summer_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_time() -> CalendarTime {
        // Wednesday 2025-12-31 23:59:30 CET
        CalendarTime {
            second: 30,
            minute: 59,
            hour: 23,
            day: 31,
            weekday: 3,
            month: 12,
            year: 25,
            summer_time: false,
        }
    }

    #[test]
    fn test_unseeded_produces_no_time() {
        let clock = FallbackClock::new();
        assert!(!clock.is_seeded());
        // whatever the free-running counter says, there is no time
        assert_eq!(clock.derive(0), None);
        assert_eq!(clock.derive(1_700_000_000), None);
    }

    #[test]
    fn test_seed_then_tick_forward() {
        let mut clock = FallbackClock::new();
        let epoch = clock.seed(&sample_time()).expect("valid date");
        assert!(clock.is_seeded());

        // 30 seconds later: year rollover, weekday advances
        let later = clock.derive(epoch + 30).expect("seeded");
        assert_eq!(later.year, 26);
        assert_eq!(later.month, 1);
        assert_eq!(later.day, 1);
        assert_eq!(later.hour, 0);
        assert_eq!(later.minute, 0);
        assert_eq!(later.second, 0);
        assert_eq!(later.weekday_name(), "Thu");
    }

    #[test]
    fn test_summer_flag_carried_from_last_decode() {
        // Derived times keep the last decode's CEST flag even across
        // what would be a DST transition; this matches the receiver
        // hardware, which cannot observe the change while unsynced.
        let mut clock = FallbackClock::new();
        let summer = CalendarTime {
            summer_time: true,
            // Saturday 2026-10-24 12:00:00
            second: 0,
            minute: 0,
            hour: 12,
            day: 24,
            weekday: 6,
            month: 10,
            year: 26,
        };
        let epoch = clock.seed(&summer).expect("valid date");

        // one week later is past the late-October changeover
        let week = 7 * 24 * 3600;
        let later = clock.derive(epoch + week).expect("seeded");
        assert!(later.summer_time);
        assert_eq!(later.day, 31);
    }

    #[test]
    fn test_reseed_overwrites() {
        let mut clock = FallbackClock::new();
        let first = clock.seed(&sample_time()).expect("valid date");

        let mut next = sample_time();
        next.minute = 0;
        next.second = 0;
        next.hour = 0;
        next.day = 1;
        next.month = 1;
        next.year = 26;
        next.weekday = 4;
        let second = clock.seed(&next).expect("valid date");
        assert_eq!(second, first + 30);
        assert_eq!(clock.derive(second), Some(next));
    }
}
