//! Bit-field accessors for the four multiplexed status bytes
//!
//! ```text
//!            7   6   5   4   3   2   1   0
//!          ┌───────┬───────┬───┬───────────┐
//! 0x00     │  SIG  │ DIFF  │CLK│    ID     │  console info
//!          ├───────┴───────┴───┴───┬───────┤
//! 0x01     │        LEVEL          │STATUS │  game state
//!          ├───────────────────────┼───┬───┤
//! 0x02     │        SPEED          │PSN│2P │  game state 2
//!          ├───────┬───────┬───────┴───┴───┤
//! 0x03     │   -   │ GRID  │    CAUSE      │  game state 3
//!          └───────┴───────┴───────────────┘
//! ```
//!
//! Every setter masks its input to the field width, so out-of-range values
//! never bleed into neighbouring fields.

#[inline]
fn get(byte: u8, mask: u8, shift: u8) -> u8 {
    (byte & mask) >> shift
}

#[inline]
fn set(byte: u8, mask: u8, shift: u8, value: u8) -> u8 {
    (byte & !mask) | ((value << shift) & mask)
}

/// Console identity, difficulty and clock sync (register 0x00)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsoleInfo(pub u8);

impl ConsoleInfo {
    /// Both bits set on every console that speaks this register map
    pub const SIGNATURE_MASK: u8 = 0b1100_0000;
    pub const DIFFICULTY_MASK: u8 = 0b0011_0000;
    pub const DIFFICULTY_SHIFT: u8 = 4;
    pub const CLOCK_SYNC_MASK: u8 = 0b0000_1000;
    pub const IDENTITY_MASK: u8 = 0b0000_0111;

    /// True if the signature bits identify a scoreboard console
    pub fn has_signature(self) -> bool {
        self.0 & Self::SIGNATURE_MASK == Self::SIGNATURE_MASK
    }

    pub fn with_signature(self) -> Self {
        Self(self.0 | Self::SIGNATURE_MASK)
    }

    pub fn identity(self) -> u8 {
        get(self.0, Self::IDENTITY_MASK, 0)
    }

    pub fn with_identity(self, id: u8) -> Self {
        Self(set(self.0, Self::IDENTITY_MASK, 0, id))
    }

    pub fn clock_sync(self) -> bool {
        self.0 & Self::CLOCK_SYNC_MASK != 0
    }

    pub fn with_clock_sync(self, on: bool) -> Self {
        Self(set(self.0, Self::CLOCK_SYNC_MASK, 3, on as u8))
    }

    pub fn difficulty(self) -> u8 {
        get(self.0, Self::DIFFICULTY_MASK, Self::DIFFICULTY_SHIFT)
    }

    pub fn with_difficulty(self, bits: u8) -> Self {
        Self(set(self.0, Self::DIFFICULTY_MASK, Self::DIFFICULTY_SHIFT, bits))
    }
}

/// Game status and playing level (register 0x01)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GameState(pub u8);

impl GameState {
    pub const STATUS_MASK: u8 = 0b0000_0011;
    pub const LEVEL_MASK: u8 = 0b1111_1100;
    pub const LEVEL_SHIFT: u8 = 2;

    pub fn status(self) -> u8 {
        get(self.0, Self::STATUS_MASK, 0)
    }

    pub fn with_status(self, bits: u8) -> Self {
        Self(set(self.0, Self::STATUS_MASK, 0, bits))
    }

    pub fn level(self) -> u8 {
        get(self.0, Self::LEVEL_MASK, Self::LEVEL_SHIFT)
    }

    pub fn with_level(self, level: u8) -> Self {
        Self(set(self.0, Self::LEVEL_MASK, Self::LEVEL_SHIFT, level))
    }
}

/// Player count, poison mode and speed (register 0x02)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GameState2(pub u8);

impl GameState2 {
    pub const TWO_PLAYERS_MASK: u8 = 0b0000_0001;
    pub const POISON_MASK: u8 = 0b0000_0010;
    pub const SPEED_MASK: u8 = 0b1111_1100;
    pub const SPEED_SHIFT: u8 = 2;

    pub fn two_players(self) -> bool {
        self.0 & Self::TWO_PLAYERS_MASK != 0
    }

    pub fn with_two_players(self, on: bool) -> Self {
        Self(set(self.0, Self::TWO_PLAYERS_MASK, 0, on as u8))
    }

    pub fn poison(self) -> bool {
        self.0 & Self::POISON_MASK != 0
    }

    pub fn with_poison(self, on: bool) -> Self {
        Self(set(self.0, Self::POISON_MASK, 1, on as u8))
    }

    pub fn speed(self) -> u8 {
        get(self.0, Self::SPEED_MASK, Self::SPEED_SHIFT)
    }

    pub fn with_speed(self, speed: u8) -> Self {
        Self(set(self.0, Self::SPEED_MASK, Self::SPEED_SHIFT, speed))
    }
}

/// Cause of death and grid size (register 0x03)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GameState3(pub u8);

impl GameState3 {
    pub const CAUSE_MASK: u8 = 0b0000_1111;
    pub const GRID_MASK: u8 = 0b0011_0000;
    pub const GRID_SHIFT: u8 = 4;

    pub fn cause_of_death(self) -> u8 {
        get(self.0, Self::CAUSE_MASK, 0)
    }

    pub fn with_cause_of_death(self, bits: u8) -> Self {
        Self(set(self.0, Self::CAUSE_MASK, 0, bits))
    }

    pub fn grid_size(self) -> u8 {
        get(self.0, Self::GRID_MASK, Self::GRID_SHIFT)
    }

    pub fn with_grid_size(self, bits: u8) -> Self {
        Self(set(self.0, Self::GRID_MASK, Self::GRID_SHIFT, bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_info_fields_are_independent() {
        let info = ConsoleInfo::default()
            .with_signature()
            .with_identity(5)
            .with_clock_sync(true)
            .with_difficulty(2);

        assert_eq!(info.0, 0b1110_1101);
        assert!(info.has_signature());
        assert_eq!(info.identity(), 5);
        assert!(info.clock_sync());
        assert_eq!(info.difficulty(), 2);
    }

    #[test]
    fn test_partial_signature_is_rejected() {
        assert!(!ConsoleInfo(0b0100_0001).has_signature());
        assert!(!ConsoleInfo(0b1000_0001).has_signature());
        assert!(ConsoleInfo(0b1100_0000).has_signature());
    }

    #[test]
    fn test_setter_masks_overflowing_value() {
        // Identity is 3 bits wide; 0x0F must not touch the clock sync bit
        let info = ConsoleInfo::default().with_identity(0x0F);
        assert_eq!(info.identity(), 7);
        assert!(!info.clock_sync());

        let state = GameState::default().with_status(3).with_level(0xFF);
        assert_eq!(state.status(), 3);
        assert_eq!(state.level(), 0x3F);
    }

    #[test]
    fn test_game_state2_layout() {
        let s = GameState2::default()
            .with_two_players(true)
            .with_poison(true)
            .with_speed(60);
        assert_eq!(s.0, (60 << 2) | 0b11);
        assert_eq!(s.speed(), 60);

        let s = s.with_poison(false);
        assert!(!s.poison());
        assert!(s.two_players());
    }

    #[test]
    fn test_game_state3_layout() {
        let s = GameState3::default().with_grid_size(2).with_cause_of_death(4);
        assert_eq!(s.0, 0b0010_0100);
        assert_eq!(s.grid_size(), 2);
        assert_eq!(s.cause_of_death(), 4);
    }
}
