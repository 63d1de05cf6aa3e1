//! Calendar clock implementations

pub mod calendar;

pub use calendar::{CalendarClock, SecondsSource};
