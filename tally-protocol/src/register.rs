//! Console register map
//!
//! Every console exposes the same 52-byte register file at its I2C
//! address. The controller reads it whole starting at offset 0 and writes
//! only the 4-byte command word at [`COMMAND_OFFSET`].
//!
//! ```text
//! 0x00 info   0x01 state  0x02 state2 0x03 state3
//! 0x04 score1             0x06 score2
//! 0x08 apples1            0x0A apples2
//! 0x0C high score         0x0E playing time
//! 0x10..0x17  apples  per difficulty (easy, medium, hard, insane)
//! 0x18..0x1F  high score per difficulty
//! 0x20..0x2B  initials per difficulty (3 bytes each)
//! 0x2C date/time word     0x30 command word
//! ```
//!
//! All multi-byte fields are big-endian.

use crate::datetime::DateTime;
use crate::fields::{ConsoleInfo, GameState, GameState2, GameState3};
use crate::types::{CauseOfDeath, Difficulty, GameStatus, GridSize};

/// Size of the register file in bytes
pub const REGISTER_FILE_SIZE: usize = 0x34;

pub const CONSOLE_INFO_OFFSET: usize = 0x00;
pub const GAME_STATE_OFFSET: usize = 0x01;
pub const GAME_STATE2_OFFSET: usize = 0x02;
pub const GAME_STATE3_OFFSET: usize = 0x03;
pub const SCORE1_OFFSET: usize = 0x04;
pub const SCORE2_OFFSET: usize = 0x06;
pub const APPLES1_OFFSET: usize = 0x08;
pub const APPLES2_OFFSET: usize = 0x0A;
pub const HIGH_SCORE_OFFSET: usize = 0x0C;
pub const PLAYING_TIME_OFFSET: usize = 0x0E;
pub const STATS_APPLES_OFFSET: usize = 0x10;
pub const STATS_HIGH_SCORE_OFFSET: usize = 0x18;
pub const INITIALS_OFFSET: usize = 0x20;
pub const DATE_TIME_OFFSET: usize = 0x2C;
pub const COMMAND_OFFSET: usize = 0x30;

/// Length of a player's initials
pub const INITIALS_LEN: usize = 3;

/// Errors decoding a register image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// Console info byte lacks the signature bits
    MissingSignature,
    /// Grid size field holds the unused value 3
    InvalidGridSize(u8),
    /// Cause of death field is outside the known set
    InvalidCauseOfDeath(u8),
}

/// Live game state of one console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    /// Console identity (3 bits)
    pub console_id: u8,
    /// Console clock has been synchronised with the controller
    pub clock_sync: bool,
    pub difficulty: Difficulty,
    pub status: GameStatus,
    /// Playing level (6 bits)
    pub level: u8,
    pub two_players: bool,
    pub poison: bool,
    /// Snake speed, 0..=60
    pub speed: u8,
    pub cause_of_death: CauseOfDeath,
    pub grid_size: GridSize,
    pub score1: u16,
    pub score2: u16,
    pub apples1: u16,
    pub apples2: u16,
    pub high_score: u16,
    /// Seconds played in the current game
    pub playing_time: u16,
}

/// Per-difficulty record of one console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DifficultyRecord {
    /// Most apples eaten in a single game
    pub apples: u16,
    pub high_score: u16,
    /// Initials of the high score holder (ASCII)
    pub initials: [u8; INITIALS_LEN],
}

impl DifficultyRecord {
    /// Initials as text, `"---"` if not printable ASCII
    pub fn initials_str(&self) -> &str {
        match core::str::from_utf8(&self.initials) {
            Ok(s) if self.initials.iter().all(|b| b.is_ascii_graphic()) => s,
            _ => "---",
        }
    }
}

/// Best results per difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStats {
    pub records: [DifficultyRecord; 4],
}

impl DeviceStats {
    pub fn record(&self, difficulty: Difficulty) -> &DifficultyRecord {
        &self.records[difficulty.index()]
    }

    pub fn record_mut(&mut self, difficulty: Difficulty) -> &mut DifficultyRecord {
        &mut self.records[difficulty.index()]
    }
}

/// Structured contents of a console register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterFile {
    pub state: DeviceState,
    pub stats: DeviceStats,
    pub clock: DateTime,
    /// Outbound command word; always zero after decoding
    pub command: u32,
}

/// Raw register file as transferred over the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterImage(pub [u8; REGISTER_FILE_SIZE]);

impl Default for RegisterImage {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterImage {
    /// All-zero image
    pub const fn new() -> Self {
        Self([0; REGISTER_FILE_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.0[offset], self.0[offset + 1]])
    }

    fn put_u16(&mut self, offset: usize, value: u16) {
        self.0[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }

    fn u32_at(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.0[offset],
            self.0[offset + 1],
            self.0[offset + 2],
            self.0[offset + 3],
        ])
    }

    fn put_u32(&mut self, offset: usize, value: u32) {
        self.0[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Console info byte, used during the bus scan
    pub fn console_info(&self) -> ConsoleInfo {
        ConsoleInfo(self.0[CONSOLE_INFO_OFFSET])
    }
}

/// Serialize a register file into its wire image
pub fn encode(file: &RegisterFile) -> RegisterImage {
    let state = &file.state;
    let mut image = RegisterImage::new();

    image.0[CONSOLE_INFO_OFFSET] = ConsoleInfo::default()
        .with_signature()
        .with_difficulty(state.difficulty.to_bits())
        .with_clock_sync(state.clock_sync)
        .with_identity(state.console_id)
        .0;
    image.0[GAME_STATE_OFFSET] = GameState::default()
        .with_level(state.level)
        .with_status(state.status.to_bits())
        .0;
    image.0[GAME_STATE2_OFFSET] = GameState2::default()
        .with_two_players(state.two_players)
        .with_poison(state.poison)
        .with_speed(state.speed)
        .0;
    image.0[GAME_STATE3_OFFSET] = GameState3::default()
        .with_cause_of_death(state.cause_of_death.to_bits())
        .with_grid_size(state.grid_size.to_bits())
        .0;

    image.put_u16(SCORE1_OFFSET, state.score1);
    image.put_u16(SCORE2_OFFSET, state.score2);
    image.put_u16(APPLES1_OFFSET, state.apples1);
    image.put_u16(APPLES2_OFFSET, state.apples2);
    image.put_u16(HIGH_SCORE_OFFSET, state.high_score);
    image.put_u16(PLAYING_TIME_OFFSET, state.playing_time);

    for (i, record) in file.stats.records.iter().enumerate() {
        image.put_u16(STATS_APPLES_OFFSET + 2 * i, record.apples);
        image.put_u16(STATS_HIGH_SCORE_OFFSET + 2 * i, record.high_score);
        let at = INITIALS_OFFSET + INITIALS_LEN * i;
        image.0[at..at + INITIALS_LEN].copy_from_slice(&record.initials);
    }

    image.put_u32(DATE_TIME_OFFSET, file.clock.pack());
    image.put_u32(COMMAND_OFFSET, file.command);
    image
}

/// Deserialize a wire image
///
/// The command word is write-only and always decodes as zero.
pub fn decode(image: &RegisterImage) -> Result<RegisterFile, RegisterError> {
    let info = image.console_info();
    if !info.has_signature() {
        return Err(RegisterError::MissingSignature);
    }
    let game = GameState(image.0[GAME_STATE_OFFSET]);
    let game2 = GameState2(image.0[GAME_STATE2_OFFSET]);
    let game3 = GameState3(image.0[GAME_STATE3_OFFSET]);

    let grid_size = GridSize::from_bits(game3.grid_size())
        .ok_or(RegisterError::InvalidGridSize(game3.grid_size()))?;
    let cause_of_death = CauseOfDeath::from_bits(game3.cause_of_death())
        .ok_or(RegisterError::InvalidCauseOfDeath(game3.cause_of_death()))?;

    // 2-bit fields cover every enum value, so these cannot fail
    let difficulty = Difficulty::from_bits(info.difficulty()).unwrap_or_default();
    let status = GameStatus::from_bits(game.status()).unwrap_or_default();

    let state = DeviceState {
        console_id: info.identity(),
        clock_sync: info.clock_sync(),
        difficulty,
        status,
        level: game.level(),
        two_players: game2.two_players(),
        poison: game2.poison(),
        speed: game2.speed(),
        cause_of_death,
        grid_size,
        score1: image.u16_at(SCORE1_OFFSET),
        score2: image.u16_at(SCORE2_OFFSET),
        apples1: image.u16_at(APPLES1_OFFSET),
        apples2: image.u16_at(APPLES2_OFFSET),
        high_score: image.u16_at(HIGH_SCORE_OFFSET),
        playing_time: image.u16_at(PLAYING_TIME_OFFSET),
    };

    let mut stats = DeviceStats::default();
    for (i, record) in stats.records.iter_mut().enumerate() {
        record.apples = image.u16_at(STATS_APPLES_OFFSET + 2 * i);
        record.high_score = image.u16_at(STATS_HIGH_SCORE_OFFSET + 2 * i);
        let at = INITIALS_OFFSET + INITIALS_LEN * i;
        record.initials.copy_from_slice(&image.0[at..at + INITIALS_LEN]);
    }

    Ok(RegisterFile {
        state,
        stats,
        clock: DateTime::unpack(image.u32_at(DATE_TIME_OFFSET)),
        command: 0,
    })
}
