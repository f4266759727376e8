//! C3 panel date/time encoding
//!
//! The panel stores timestamps as seconds in a pseudo-calendar where every
//! month has 31 days and the epoch is the year 2000:
//!
//! ```text
//! value = ((year - 2000) * 12 * 31 + (month - 1) * 31 + (day - 1)) * 86400
//!         + hour * 3600 + minute * 60 + second
//! ```
//!
//! Values decoded from the panel may name days that do not exist in the
//! Gregorian calendar (e.g. February 31st), so this type keeps the raw
//! fields and only converts to `chrono` on request.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;
const SECONDS_PER_MONTH: u32 = 31 * SECONDS_PER_DAY;
const SECONDS_PER_YEAR: u32 = 12 * SECONDS_PER_MONTH;

/// Date and time in the panel's 31-day-month calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct C3DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl C3DateTime {
    /// Create a date/time, validating field ranges of the pseudo-calendar
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if year < 2000 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(Error::Validation(format!(
                "date {year:04}-{month:02}-{day:02} is outside the C3 calendar"
            )));
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Error::Validation(format!(
                "time {hour:02}:{minute:02}:{second:02} is invalid"
            )));
        }

        let dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        dt.to_value()?;

        Ok(dt)
    }

    /// Decode a panel timestamp
    pub fn from_value(value: u32) -> Self {
        Self {
            year: 2000 + (value / SECONDS_PER_YEAR) as u16,
            month: 1 + ((value / SECONDS_PER_MONTH) % 12) as u8,
            day: 1 + ((value / SECONDS_PER_DAY) % 31) as u8,
            hour: ((value / 3600) % 24) as u8,
            minute: ((value / 60) % 60) as u8,
            second: (value % 60) as u8,
        }
    }

    /// Encode as a panel timestamp
    ///
    /// Fails for dates before 2000 or after 2133-08-18 06:28:15, the last
    /// second a panel timestamp can hold.
    pub fn to_value(&self) -> Result<u32> {
        let out_of_range = || Error::Validation(format!("{self} is outside the C3 calendar"));

        let years = u32::from(self.year).checked_sub(2000).ok_or_else(out_of_range)?;
        let months = u32::from(self.month).checked_sub(1).ok_or_else(out_of_range)?;
        let days = u32::from(self.day).checked_sub(1).ok_or_else(out_of_range)?;
        let seconds = u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second);

        years
            .checked_mul(12 * 31)
            .and_then(|d| d.checked_add(months * 31 + days))
            .and_then(|d| d.checked_mul(SECONDS_PER_DAY))
            .and_then(|s| s.checked_add(seconds))
            .ok_or_else(out_of_range)
    }

    /// Convert to a calendar date/time
    ///
    /// Returns `None` for pseudo-dates without a real calendar day.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))?
            .and_hms_opt(u32::from(self.hour), u32::from(self.minute), u32::from(self.second))
    }
}

impl TryFrom<NaiveDateTime> for C3DateTime {
    type Error = Error;

    fn try_from(dt: NaiveDateTime) -> Result<Self> {
        let year = u16::try_from(dt.year())
            .map_err(|_| Error::Validation(format!("year {} out of range", dt.year())))?;

        Self::new(
            year,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
        )
    }
}

impl FromStr for C3DateTime {
    type Err = Error;

    /// Parse the `YYYY-MM-DD HH:MM:SS` form used by key/value records
    fn from_str(s: &str) -> Result<Self> {
        let dt = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
            .map_err(|e| Error::Parse(format!("invalid time '{s}': {e}")))?;

        Self::try_from(dt)
    }
}

impl fmt::Display for C3DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
