//! Aggregator state: the five console slots and the operator settings

use tally_protocol::{DeviceState, DeviceStats};

/// Number of console slots
pub const SLOT_COUNT: usize = 5;

/// Bus address of slot 0; slot `i` lives at `FIRST_ADDRESS + i`
pub const FIRST_ADDRESS: u8 = 0x10;

/// Snake names indexed by console identity
pub const SNAKE_NAMES: [&str; 6] = [
    "",
    "Ball Python",
    "Red-Tail Boa",
    "Black Rat Snake",
    "King Snake",
    "Corn Snake",
];

/// Display name for a console identity
pub fn snake_name(console_id: u8) -> &'static str {
    SNAKE_NAMES.get(console_id as usize).copied().unwrap_or("Unknown")
}

/// Response dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputMode {
    /// Human-readable prose with CRLF line endings
    Terminal,
    /// Tab-separated `OK`/`ERR` lines for a host program
    Pc,
    /// Brace-delimited records for the scoreboard display
    #[default]
    Scoreboard,
}

impl OutputMode {
    pub fn label(self) -> &'static str {
        match self {
            OutputMode::Terminal => "terminal",
            OutputMode::Pc => "pc_console",
            OutputMode::Scoreboard => "scoreboard",
        }
    }
}

/// Bus bookkeeping for one console position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSlot {
    /// Identity reported during the last scan
    pub device_id: u8,
    pub address: u8,
    /// Answered the last scan or read
    pub is_active: bool,
    /// State was read successfully since it (re)appeared
    pub is_connected: bool,
}

impl DeviceSlot {
    pub const fn new(index: usize) -> Self {
        Self {
            device_id: 0,
            address: FIRST_ADDRESS + index as u8,
            is_active: false,
            is_connected: false,
        }
    }

    /// Back to power-on defaults, keeping the address
    pub fn reset(&mut self) {
        *self = Self {
            address: self.address,
            ..Self::new(0)
        };
    }
}

/// Everything the scoreboard knows
///
/// Owned by the orchestrator; the dispatcher borrows it per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorState {
    pub mode: OutputMode,
    /// Emit a score listing after every refresh
    pub polling: bool,
    /// Synthesize console state instead of reading the bus
    pub demo_mode: bool,
    /// Demo state has been synthesized since demo mode was enabled
    pub demo_initialized: bool,
    pub tournament_active: bool,
    pub slots: [DeviceSlot; SLOT_COUNT],
    pub states: [DeviceState; SLOT_COUNT],
    pub stats: [DeviceStats; SLOT_COUNT],
}

impl Default for AggregatorState {
    fn default() -> Self {
        Self::new(OutputMode::default())
    }
}

impl AggregatorState {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            polling: false,
            demo_mode: false,
            demo_initialized: false,
            tournament_active: false,
            slots: core::array::from_fn(DeviceSlot::new),
            states: [DeviceState::default(); SLOT_COUNT],
            stats: [DeviceStats::default(); SLOT_COUNT],
        }
    }

    /// Forget everything about slot `index`
    pub fn clear_slot(&mut self, index: usize) {
        self.slots[index].reset();
        self.states[index] = DeviceState::default();
        self.stats[index] = DeviceStats::default();
    }

    pub fn clear_all_slots(&mut self) {
        for index in 0..SLOT_COUNT {
            self.clear_slot(index);
        }
    }

    /// Indices of slots with readable state
    pub fn connected(&self) -> impl Iterator<Item = usize> + '_ {
        (0..SLOT_COUNT).filter(|&i| self.slots[i].is_connected)
    }

    pub fn connected_count(&self) -> usize {
        self.connected().count()
    }

    /// Indices of slots that answer on the bus
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        (0..SLOT_COUNT).filter(|&i| self.slots[i].is_active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }
}
