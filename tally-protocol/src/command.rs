//! Controller → console command word
//!
//! ```text
//! 31   27   23      16        8        0
//! ┌─────┬────┬───────┬────────┬────────┐
//! │00000│ OP │reserve│ PARAM2 │ PARAM1 │
//! └─────┴────┴───────┴────────┴────────┘
//! ```
//!
//! The word is written big-endian to the command register of every active
//! console. A zero word means "nothing to send".

/// Bit position of the opcode nibble
pub const OPCODE_SHIFT: u32 = 23;
/// Opcode nibble mask
pub const OPCODE_MASK: u32 = 0b1111 << OPCODE_SHIFT;
pub const PARAM1_MASK: u32 = 0xFF;
pub const PARAM2_SHIFT: u32 = 8;
pub const PARAM2_MASK: u32 = 0xFF << PARAM2_SHIFT;

// Opcode wire values
const OP_SET_SPEED: u8 = 0x1;
const OP_SET_LEVEL: u8 = 0x2;
const OP_SET_POISON: u8 = 0x3;
const OP_PREPARE_GAME: u8 = 0x4;
const OP_START_GAME: u8 = 0x5;
const OP_PAUSE_GAME: u8 = 0x6;
const OP_END_GAME: u8 = 0x7;
const OP_RANDOM_SEED: u8 = 0x8;
const OP_TOURNAMENT_END: u8 = 0x9;

/// Valid `SetSpeed` range
pub const SPEED_RANGE: core::ops::RangeInclusive<u8> = 1..=100;
/// Valid `StartGame` speed range (0 keeps the console's own speed)
pub const START_SPEED_RANGE: core::ops::RangeInclusive<u8> = 0..=100;
/// Valid `SetLevel` range
pub const LEVEL_RANGE: core::ops::RangeInclusive<u8> = 1..=4;
/// Valid `PrepareGame` level range
pub const PREPARE_LEVEL_RANGE: core::ops::RangeInclusive<u8> = 0..=3;

/// Command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    SetSpeed,
    SetLevel,
    SetPoison,
    PrepareGame,
    StartGame,
    PauseGame,
    EndGame,
    RandomSeed,
    TournamentEnd,
}

impl Opcode {
    /// Parse from the 4-bit wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            OP_SET_SPEED => Some(Opcode::SetSpeed),
            OP_SET_LEVEL => Some(Opcode::SetLevel),
            OP_SET_POISON => Some(Opcode::SetPoison),
            OP_PREPARE_GAME => Some(Opcode::PrepareGame),
            OP_START_GAME => Some(Opcode::StartGame),
            OP_PAUSE_GAME => Some(Opcode::PauseGame),
            OP_END_GAME => Some(Opcode::EndGame),
            OP_RANDOM_SEED => Some(Opcode::RandomSeed),
            OP_TOURNAMENT_END => Some(Opcode::TournamentEnd),
            _ => None,
        }
    }

    /// Convert to the 4-bit wire value
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::SetSpeed => OP_SET_SPEED,
            Opcode::SetLevel => OP_SET_LEVEL,
            Opcode::SetPoison => OP_SET_POISON,
            Opcode::PrepareGame => OP_PREPARE_GAME,
            Opcode::StartGame => OP_START_GAME,
            Opcode::PauseGame => OP_PAUSE_GAME,
            Opcode::EndGame => OP_END_GAME,
            Opcode::RandomSeed => OP_RANDOM_SEED,
            Opcode::TournamentEnd => OP_TOURNAMENT_END,
        }
    }

    /// Number of whitespace-separated parameters the command takes
    pub fn param_count(self) -> usize {
        match self {
            Opcode::PrepareGame => 2,
            Opcode::PauseGame | Opcode::EndGame | Opcode::TournamentEnd => 0,
            _ => 1,
        }
    }
}

/// A validated console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceCommand {
    SetSpeed(u8),
    SetLevel(u8),
    SetPoison(bool),
    PrepareGame { level: u8, poison: bool },
    StartGame { speed: u8 },
    PauseGame,
    EndGame,
    RandomSeed(u16),
    TournamentEnd,
}

impl DeviceCommand {
    /// Build a command from an opcode and its textual parameters
    ///
    /// Returns `None` if the parameter count is wrong or any value is out
    /// of range.
    pub fn parse(opcode: Opcode, params: &str) -> Option<Self> {
        let mut tokens = params.split_whitespace();
        let mut next = || tokens.next();

        let command = match opcode {
            Opcode::SetSpeed => {
                let speed = next()?.parse::<u8>().ok().filter(|s| SPEED_RANGE.contains(s))?;
                DeviceCommand::SetSpeed(speed)
            }
            Opcode::SetLevel => {
                let level = next()?.parse::<u8>().ok().filter(|l| LEVEL_RANGE.contains(l))?;
                DeviceCommand::SetLevel(level)
            }
            Opcode::SetPoison => DeviceCommand::SetPoison(parse_flag(next()?)?),
            Opcode::PrepareGame => {
                let level = next()?
                    .parse::<u8>()
                    .ok()
                    .filter(|l| PREPARE_LEVEL_RANGE.contains(l))?;
                let poison = parse_flag(next()?)?;
                DeviceCommand::PrepareGame { level, poison }
            }
            Opcode::StartGame => {
                let speed = next()?
                    .parse::<u8>()
                    .ok()
                    .filter(|s| START_SPEED_RANGE.contains(s))?;
                DeviceCommand::StartGame { speed }
            }
            Opcode::PauseGame => DeviceCommand::PauseGame,
            Opcode::EndGame => DeviceCommand::EndGame,
            Opcode::RandomSeed => DeviceCommand::RandomSeed(next()?.parse::<u16>().ok()?),
            Opcode::TournamentEnd => DeviceCommand::TournamentEnd,
        };

        // Trailing tokens make the whole command invalid
        if next().is_some() {
            return None;
        }
        Some(command)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            DeviceCommand::SetSpeed(_) => Opcode::SetSpeed,
            DeviceCommand::SetLevel(_) => Opcode::SetLevel,
            DeviceCommand::SetPoison(_) => Opcode::SetPoison,
            DeviceCommand::PrepareGame { .. } => Opcode::PrepareGame,
            DeviceCommand::StartGame { .. } => Opcode::StartGame,
            DeviceCommand::PauseGame => Opcode::PauseGame,
            DeviceCommand::EndGame => Opcode::EndGame,
            DeviceCommand::RandomSeed(_) => Opcode::RandomSeed,
            DeviceCommand::TournamentEnd => Opcode::TournamentEnd,
        }
    }

    /// (param1, param2)
    pub fn params(&self) -> (u8, u8) {
        match *self {
            DeviceCommand::SetSpeed(speed) => (speed, 0),
            DeviceCommand::SetLevel(level) => (level, 0),
            DeviceCommand::SetPoison(on) => (on as u8, 0),
            DeviceCommand::PrepareGame { level, poison } => (level, poison as u8),
            DeviceCommand::StartGame { speed } => (speed, 0),
            DeviceCommand::RandomSeed(seed) => {
                let [high, low] = seed.to_be_bytes();
                (low, high)
            }
            DeviceCommand::PauseGame | DeviceCommand::EndGame | DeviceCommand::TournamentEnd => {
                (0, 0)
            }
        }
    }

    /// Pack into the 32-bit command word
    pub fn to_word(&self) -> u32 {
        let (param1, param2) = self.params();
        ((self.opcode().to_byte() as u32) << OPCODE_SHIFT)
            | ((param2 as u32) << PARAM2_SHIFT)
            | param1 as u32
    }

    /// Unpack a command word (console side, and for diagnostics)
    pub fn from_word(word: u32) -> Option<Self> {
        let opcode = Opcode::from_byte(opcode_bits(word))?;
        let param1 = (word & PARAM1_MASK) as u8;
        let param2 = ((word & PARAM2_MASK) >> PARAM2_SHIFT) as u8;

        Some(match opcode {
            Opcode::SetSpeed => DeviceCommand::SetSpeed(param1),
            Opcode::SetLevel => DeviceCommand::SetLevel(param1),
            Opcode::SetPoison => DeviceCommand::SetPoison(param1 != 0),
            Opcode::PrepareGame => DeviceCommand::PrepareGame {
                level: param1,
                poison: param2 != 0,
            },
            Opcode::StartGame => DeviceCommand::StartGame { speed: param1 },
            Opcode::PauseGame => DeviceCommand::PauseGame,
            Opcode::EndGame => DeviceCommand::EndGame,
            Opcode::RandomSeed => DeviceCommand::RandomSeed(u16::from_be_bytes([param2, param1])),
            Opcode::TournamentEnd => DeviceCommand::TournamentEnd,
        })
    }
}

/// Opcode nibble of a command word
pub fn opcode_bits(word: u32) -> u8 {
    ((word & OPCODE_MASK) >> OPCODE_SHIFT) as u8
}

/// Encode a command from its textual parameters
///
/// Returns 0 (do not transmit) if the parameters fail validation.
pub fn encode_command(opcode: Opcode, params: &str) -> u32 {
    DeviceCommand::parse(opcode, params)
        .map(|command| command.to_word())
        .unwrap_or(0)
}

fn parse_flag(token: &str) -> Option<bool> {
    match token {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}
