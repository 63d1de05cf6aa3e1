//! Software calendar clock
//!
//! Keeps a date and time-of-day anchored to a monotonic seconds count. The
//! current value is always computed from the anchor, so the clock never
//! drifts from its source and needs no periodic ticking.

use tally_core::traits::{Clock, ClockError};
use tally_protocol::{Date, Time};

const SECONDS_PER_DAY: u64 = 86_400;

const LAST_SECOND: Time = Time {
    hour: 23,
    minute: 59,
    second: 59,
};

/// Monotonic seconds since some fixed origin (usually boot)
pub trait SecondsSource {
    fn seconds(&self) -> u64;
}

/// Calendar clock built on a [`SecondsSource`]
pub struct CalendarClock<S> {
    source: S,
    /// Date at the anchor
    base_date: Date,
    /// Seconds since midnight at the anchor
    base_seconds: u32,
    /// Source reading at the anchor
    anchor: u64,
}

impl<S: SecondsSource> CalendarClock<S> {
    /// Start counting from `date` and `time` now
    pub fn new(source: S, date: Date, time: Time) -> Self {
        let anchor = source.seconds();
        Self {
            source,
            base_date: date,
            base_seconds: time.seconds_of_day(),
            anchor,
        }
    }

    fn now(&self) -> (Date, Time) {
        let elapsed = self.source.seconds().saturating_sub(self.anchor);
        let total = self.base_seconds as u64 + elapsed;

        let mut date = self.base_date;
        for _ in 0..total / SECONDS_PER_DAY {
            match date.next_day() {
                Some(next) => date = next,
                // Past the last representable day: hold its last second
                None => return (date, LAST_SECOND),
            }
        }

        let time = Time::from_seconds_of_day((total % SECONDS_PER_DAY) as u32);
        (date, time)
    }

    fn rebase(&mut self, date: Date, time: Time) {
        self.base_date = date;
        self.base_seconds = time.seconds_of_day();
        self.anchor = self.source.seconds();
    }
}

impl<S: SecondsSource> Clock for CalendarClock<S> {
    fn date(&mut self) -> Date {
        self.now().0
    }

    fn time(&mut self) -> Time {
        self.now().1
    }

    fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
        let (_, time) = self.now();
        self.rebase(date, time);
        Ok(())
    }

    fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
        let (date, _) = self.now();
        self.rebase(date, time);
        Ok(())
    }
}
