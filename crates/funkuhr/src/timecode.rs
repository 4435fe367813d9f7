//! DCF77 time-code validation and calendar decoding

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Timelike};
use thiserror::Error;

use crate::framing::Frame;

/// A fully-decoded DCF77 calendar time
///
/// Produced only by a successful [`decode_frame()`] run and immutable
/// thereafter. The broadcast carries local time (CET or CEST, per
/// [`summer_time`](CalendarTime::summer_time)); no timezone conversion
/// is applied here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CalendarTime {
    /// Second of minute, 0..=59
    pub second: u8,
    /// Minute of hour, 0..=59
    pub minute: u8,
    /// Hour of day, 0..=23
    pub hour: u8,
    /// Day of month, 1..=31
    pub day: u8,
    /// Day of week, 1 (Monday) ..= 7 (Sunday)
    pub weekday: u8,
    /// Month of year, 1..=12
    pub month: u8,
    /// Year within the 2000 century, 0..=99
    pub year: u8,
    /// True if the broadcast time is CEST (daylight saving)
    pub summer_time: bool,
}

impl CalendarTime {
    /// Seconds since the Unix epoch, in broadcast local time
    ///
    /// The fields are interpreted as a civil date/time and counted
    /// from 1970-01-01 00:00:00 without any timezone offset. Fails
    /// with [`TimecodeErr::InvalidDate`] if the fields do not form a
    /// real calendar date/time.
    pub fn to_epoch_seconds(&self) -> Result<i64, TimecodeErr> {
        let date = NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .ok_or(TimecodeErr::InvalidDate)?;
        let datetime = date
            .and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
            .ok_or(TimecodeErr::InvalidDate)?;
        Ok(datetime.and_utc().timestamp())
    }

    /// Reconstruct a calendar time from an epoch second count
    ///
    /// Inverse of [`to_epoch_seconds()`](Self::to_epoch_seconds),
    /// with leap-year-aware month/day rollover and derived weekday.
    /// The summer-time flag is not encoded in the epoch and must be
    /// supplied by the caller. Returns `None` if `epoch_seconds`
    /// falls outside the representable 2000..=2099 year range.
    pub fn from_epoch_seconds(epoch_seconds: i64, summer_time: bool) -> Option<Self> {
        let datetime = DateTime::from_timestamp(epoch_seconds, 0)?.naive_utc();
        if !(2000..=2099).contains(&datetime.year()) {
            return None;
        }
        Some(Self {
            second: datetime.second() as u8,
            minute: datetime.minute() as u8,
            hour: datetime.hour() as u8,
            day: datetime.day() as u8,
            weekday: datetime.weekday().number_from_monday() as u8,
            month: datetime.month() as u8,
            year: (datetime.year() - 2000) as u8,
            summer_time,
        })
    }

    /// Three-letter English weekday abbreviation
    pub fn weekday_name(&self) -> &'static str {
        match self.weekday {
            1 => "Mon",
            2 => "Tue",
            3 => "Wed",
            4 => "Thu",
            5 => "Fri",
            6 => "Sat",
            7 => "Sun",
            _ => "???",
        }
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02} {} {:02}.{:02}.20{:02} {}",
            self.hour,
            self.minute,
            self.second,
            self.weekday_name(),
            self.day,
            self.month,
            self.year,
            if self.summer_time { "CEST" } else { "CET" }
        )
    }
}

/// Error validating or decoding a time-code frame
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimecodeErr {
    /// A required bit slot was never filled with a data bit
    #[error("invalid time code: frame has unfilled bit slots")]
    Incomplete,

    /// Bit 0 must always be zero
    #[error("invalid time code: start-of-minute bit is not zero")]
    StartBit,

    /// Bit 20 marks the start of the encoded time and must be one
    #[error("invalid time code: start-of-time marker is not one")]
    TimeMark,

    /// Even parity failed over the given inclusive bit range
    #[error("invalid time code: parity failure over bits {0}..={1}")]
    Parity(u8, u8),

    /// Fields passed parity but do not form a real calendar date
    #[error("invalid time code: fields do not form a real calendar date")]
    InvalidDate,
}

/// Validate and decode a completed 60-slot frame
///
/// `second` is the current bit-slot cursor at decode time; at the top
/// of a freshly-aligned minute it is 0. Bit sub-fields are BCD in
/// little-endian bit order (bit *i* of a sub-field contributes 2^*i*):
///
/// | field   | bits    |
/// |---------|---------|
/// | CEST    | 17      |
/// | minute  | 21–27   |
/// | hour    | 29–34   |
/// | day     | 36–41   |
/// | weekday | 42–44   |
/// | month   | 45–49   |
/// | year    | 50–57   |
///
/// Validity requires bit 0 = 0, bit 20 = 1, and even parity over bits
/// 21–28, 29–35, and 36–58. A frame which passes those checks but
/// encodes an impossible calendar date (month 13, Feb 30, …) is also
/// rejected; such a frame must never seed the fallback clock.
pub fn decode_frame(frame: &Frame, second: u8) -> Result<CalendarTime, TimecodeErr> {
    if frame_bit(frame, 0)? {
        return Err(TimecodeErr::StartBit);
    }
    if !frame_bit(frame, 20)? {
        return Err(TimecodeErr::TimeMark);
    }
    for (from, to) in [(21, 28), (29, 35), (36, 58)] {
        if range_parity(frame, from, to)? {
            return Err(TimecodeErr::Parity(from, to));
        }
    }

    let time = CalendarTime {
        second,
        minute: 10 * field(frame, 25, 3)? + field(frame, 21, 4)?,
        hour: 10 * field(frame, 33, 2)? + field(frame, 29, 4)?,
        day: 10 * field(frame, 40, 2)? + field(frame, 36, 4)?,
        weekday: field(frame, 42, 3)?,
        month: 10 * field(frame, 49, 1)? + field(frame, 45, 4)?,
        year: 10 * field(frame, 54, 4)? + field(frame, 50, 4)?,
        summer_time: frame_bit(frame, 17)?,
    };

    // parity cannot catch an even number of flipped bits; refuse
    // anything that is not a real date
    time.to_epoch_seconds()?;
    Ok(time)
}

// Little-endian BCD value of a bit slice: bit i contributes 2^i
pub(crate) fn decode_bcd(bits: &[bool]) -> u8 {
    bits.iter()
        .enumerate()
        .map(|(i, bit)| (*bit as u8) << i)
        .sum()
}

// XOR over a bit slice: true for an odd number of set bits
pub(crate) fn parity(bits: &[bool]) -> bool {
    bits.iter().fold(false, |acc, bit| acc ^ *bit)
}

fn frame_bit(frame: &Frame, index: u8) -> Result<bool, TimecodeErr> {
    frame.bit(usize::from(index)).ok_or(TimecodeErr::Incomplete)
}

fn field(frame: &Frame, start: u8, len: u8) -> Result<u8, TimecodeErr> {
    debug_assert!(len <= 8);
    let mut bits = [false; 8];
    for i in 0..len {
        bits[usize::from(i)] = frame_bit(frame, start + i)?;
    }
    Ok(decode_bcd(&bits[..usize::from(len)]))
}

fn range_parity(frame: &Frame, from: u8, to: u8) -> Result<bool, TimecodeErr> {
    let mut acc = false;
    for i in from..=to {
        acc ^= frame_bit(frame, i)?;
    }
    Ok(acc)
}

// Build a frame encoding the given fields, with correct parity bits.
// Slot 59 is left untouched for the boundary marker. Test support for
// this module and for the framing/receiver tests.
#[cfg(test)]
pub(crate) fn encode_frame(time: &CalendarTime) -> Frame {
    fn put_bcd(bits: &mut [bool; 59], start: usize, len: usize, value: u8) {
        for i in 0..len {
            bits[start + i] = (value >> i) & 1 == 1;
        }
    }

    let mut bits = [false; 59];

    bits[17] = time.summer_time;
    bits[20] = true;
    put_bcd(&mut bits, 21, 4, time.minute % 10);
    put_bcd(&mut bits, 25, 3, time.minute / 10);
    put_bcd(&mut bits, 29, 4, time.hour % 10);
    put_bcd(&mut bits, 33, 2, time.hour / 10);
    put_bcd(&mut bits, 36, 4, time.day % 10);
    put_bcd(&mut bits, 40, 2, time.day / 10);
    put_bcd(&mut bits, 42, 3, time.weekday);
    put_bcd(&mut bits, 45, 4, time.month % 10);
    put_bcd(&mut bits, 49, 1, time.month / 10);
    put_bcd(&mut bits, 50, 4, time.year % 10);
    put_bcd(&mut bits, 54, 4, time.year / 10);

    bits[28] = parity(&bits[21..28]);
    bits[35] = parity(&bits[29..35]);
    bits[58] = parity(&bits[36..58]);

    let mut frame = Frame::new();
    for (i, bit) in bits.iter().enumerate() {
        frame.set_bit(i, *bit);
    }
    frame
}
