//! Calendar types and the packed date/time register word
//!
//! ```text
//! 31    26   22    17    12     6      0
//! ┌──────┬────┬─────┬─────┬──────┬──────┐
//! │YYYYYY│MMMM│DDDDD│HHHHH│MMMMMM│SSSSSS│
//! └──────┴────┴─────┴─────┴──────┴──────┘
//! ```
//!
//! The year field is an offset from 2000, which limits representable
//! dates to 2000-01-01 ..= 2063-12-31.

use core::fmt;

/// First year representable in the packed word
pub const BASE_YEAR: u16 = 2000;
/// Last year representable in the packed word
pub const MAX_YEAR: u16 = BASE_YEAR + 0b11_1111;

const YEAR_SHIFT: u32 = 26;
const YEAR_MASK: u32 = 0b11_1111 << YEAR_SHIFT;
const MONTH_SHIFT: u32 = 22;
const MONTH_MASK: u32 = 0b1111 << MONTH_SHIFT;
const DAY_SHIFT: u32 = 17;
const DAY_MASK: u32 = 0b1_1111 << DAY_SHIFT;
const HOUR_SHIFT: u32 = 12;
const HOUR_MASK: u32 = 0b1_1111 << HOUR_SHIFT;
const MINUTE_SHIFT: u32 = 6;
const MINUTE_MASK: u32 = 0b11_1111 << MINUTE_SHIFT;
const SECOND_MASK: u32 = 0b11_1111;

/// Number of days in `month` of `year` (0 for an invalid month)
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    /// Create a validated date within the representable range
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        if !(BASE_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }
        if day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Parse `YYYY-MM-DD`
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('-');
        let year = parts.next()?;
        let month = parts.next()?;
        let day = parts.next()?;
        if parts.next().is_some() || year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    }

    /// The following calendar day, or `None` past the last representable date
    pub fn next_day(self) -> Option<Self> {
        if self.day < days_in_month(self.year, self.month) {
            return Some(Self { day: self.day + 1, ..self });
        }
        if self.month < 12 {
            return Some(Self { month: self.month + 1, day: 1, ..self });
        }
        Self::new(self.year + 1, 1, 1)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Time {
    /// Create a validated time
    pub fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            second,
        })
    }

    /// Parse `HH:MM:SS`
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(':');
        let hour = parts.next()?;
        let minute = parts.next()?;
        let second = parts.next()?;
        if parts.next().is_some() || hour.len() != 2 || minute.len() != 2 || second.len() != 2 {
            return None;
        }
        Self::new(
            hour.parse().ok()?,
            minute.parse().ok()?,
            second.parse().ok()?,
        )
    }

    /// Seconds since midnight
    pub fn seconds_of_day(self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }

    /// Build from seconds since midnight (wraps at 24h)
    pub fn from_seconds_of_day(secs: u32) -> Self {
        let secs = secs % 86_400;
        Self {
            hour: (secs / 3600) as u8,
            minute: (secs / 60 % 60) as u8,
            second: (secs % 60) as u8,
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Date and time as stored in the console register map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl Default for DateTime {
    fn default() -> Self {
        Self {
            date: Date {
                year: BASE_YEAR,
                month: 1,
                day: 1,
            },
            time: Time::default(),
        }
    }
}

impl DateTime {
    /// Pack into the 32-bit register word
    pub fn pack(&self) -> u32 {
        let year = self.date.year.saturating_sub(BASE_YEAR) as u32;
        ((year << YEAR_SHIFT) & YEAR_MASK)
            | ((self.date.month as u32) << MONTH_SHIFT & MONTH_MASK)
            | ((self.date.day as u32) << DAY_SHIFT & DAY_MASK)
            | ((self.time.hour as u32) << HOUR_SHIFT & HOUR_MASK)
            | ((self.time.minute as u32) << MINUTE_SHIFT & MINUTE_MASK)
            | (self.time.second as u32 & SECOND_MASK)
    }

    /// Unpack a register word
    ///
    /// Field values are taken as-is; a console that has never had its clock
    /// synchronised reports zero month and day.
    pub fn unpack(word: u32) -> Self {
        Self {
            date: Date {
                year: BASE_YEAR + ((word & YEAR_MASK) >> YEAR_SHIFT) as u16,
                month: ((word & MONTH_MASK) >> MONTH_SHIFT) as u8,
                day: ((word & DAY_MASK) >> DAY_SHIFT) as u8,
            },
            time: Time {
                hour: ((word & HOUR_MASK) >> HOUR_SHIFT) as u8,
                minute: ((word & MINUTE_MASK) >> MINUTE_SHIFT) as u8,
                second: (word & SECOND_MASK) as u8,
            },
        }
    }
}
