//! Enumerated fields carried in the console status bytes

/// Game progress reported by a console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameStatus {
    /// No game in progress
    #[default]
    Stopped,
    /// Game running
    Running,
    /// Game paused by the player or the controller
    Paused,
    /// Game ended
    Over,
}

impl GameStatus {
    /// Parse from the 2-bit wire value
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(GameStatus::Stopped),
            1 => Some(GameStatus::Running),
            2 => Some(GameStatus::Paused),
            3 => Some(GameStatus::Over),
            _ => None,
        }
    }

    /// Convert to the 2-bit wire value
    pub fn to_bits(self) -> u8 {
        self as u8
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Stopped => "Stopped",
            GameStatus::Running => "Running",
            GameStatus::Paused => "Paused",
            GameStatus::Over => "Over",
        }
    }
}

/// Playing difficulty ("level mode" on the console)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Insane,
}

impl Difficulty {
    /// All difficulties in wire order
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Insane,
    ];

    /// Parse from the 2-bit wire value
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }

    /// Convert to the 2-bit wire value
    pub fn to_bits(self) -> u8 {
        self as u8
    }

    /// Index into per-difficulty tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Insane => "Insane",
        }
    }
}

/// Playfield dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GridSize {
    /// 16 x 16 cells
    #[default]
    Small,
    /// 32 x 16 cells
    Wide,
    /// 32 x 32 cells
    Large,
}

impl GridSize {
    /// Parse from the 2-bit wire value (3 is unused)
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(GridSize::Small),
            1 => Some(GridSize::Wide),
            2 => Some(GridSize::Large),
            _ => None,
        }
    }

    /// Convert to the 2-bit wire value
    pub fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Why the last snake died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CauseOfDeath {
    /// Still alive, or no game played yet
    #[default]
    None,
    /// Ran into the other snake
    Body,
    /// Choked on food
    Food,
    /// Ate poisoned food
    PoisonFood,
    /// Hit the wall
    Wall,
    /// Bit its own tail
    SelfCollision,
}

impl CauseOfDeath {
    /// All causes in wire order
    pub const ALL: [CauseOfDeath; 6] = [
        CauseOfDeath::None,
        CauseOfDeath::Body,
        CauseOfDeath::Food,
        CauseOfDeath::PoisonFood,
        CauseOfDeath::Wall,
        CauseOfDeath::SelfCollision,
    ];

    /// Parse from the 4-bit wire value
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }

    /// Convert to the 4-bit wire value
    pub fn to_bits(self) -> u8 {
        self as u8
    }
}
