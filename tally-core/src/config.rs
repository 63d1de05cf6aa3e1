//! Configuration type definitions
//!
//! Timing and presentation settings for the scoreboard loop. The firmware
//! fills these from its embedded TOML file; anything left out keeps the
//! default below.

use tally_protocol::{Date, Time};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::scoreboard::state::OutputMode;

/// Scoreboard loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreboardConfig {
    /// Length of one loop quantum (ms)
    pub quantum_ms: u16,
    /// Quanta before the first refresh after start
    pub first_refresh_quanta: u16,
    /// Quanta between refreshes
    pub refresh_quanta: u16,
    /// Refreshes between periodic bus scans (0 disables them)
    pub rescan_refreshes: u16,
    /// Date the clock is set to on start
    pub baseline_date: Date,
    /// Time the clock is set to on start
    pub baseline_time: Time,
    /// Dialect in effect after start
    pub default_mode: OutputMode,
    /// Upper bound on a single bus transaction (ms)
    pub bus_timeout_ms: u16,
    /// Indicator blink period for live consoles (ms)
    pub blink_period_ms: u16,
    /// Indicator blinks per refresh
    pub blink_count: u8,
}

impl ScoreboardConfig {
    pub const fn new() -> Self {
        Self {
            quantum_ms: 1,
            first_refresh_quanta: 1000,
            refresh_quanta: 500,
            rescan_refreshes: 5,
            baseline_date: Date {
                year: 2024,
                month: 1,
                day: 1,
            },
            baseline_time: Time {
                hour: 23,
                minute: 59,
                second: 30,
            },
            default_mode: OutputMode::Scoreboard,
            bus_timeout_ms: 15,
            blink_period_ms: 400,
            blink_count: 6,
        }
    }

    /// Wall-clock time between refreshes (ms)
    pub fn refresh_interval_ms(&self) -> u32 {
        self.quantum_ms as u32 * self.refresh_quanta as u32
    }
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScoreboardConfig::default();
        assert_eq!(config.refresh_interval_ms(), 500);
        assert_eq!(config.baseline_date, Date::new(2024, 1, 1).unwrap());
        assert_eq!(config.baseline_time, Time::new(23, 59, 30).unwrap());
        assert_eq!(config.default_mode, OutputMode::Scoreboard);
    }
}
