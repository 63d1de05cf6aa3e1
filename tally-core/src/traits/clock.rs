//! Real-time clock trait

use tally_protocol::{Date, Time};

/// Errors setting the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// The clock refused the value
    Rejected,
    /// The clock is not running
    Unavailable,
}

/// Calendar clock service
///
/// Values handed to the setters are already validated.
pub trait Clock {
    fn date(&mut self) -> Date;

    fn time(&mut self) -> Time;

    fn set_date(&mut self, date: Date) -> Result<(), ClockError>;

    fn set_time(&mut self, time: Time) -> Result<(), ClockError>;
}
