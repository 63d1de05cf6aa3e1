//! Command line tokenizer
//!
//! A line is a verb followed by whitespace-separated parameters. The verb
//! table fixes the parameter count of every command.

use tally_protocol::Opcode;

/// Every command the operator can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    TerminalMode,
    PcMode,
    ScoreboardMode,
    SetDate,
    SetTime,
    GetDate,
    GetTime,
    Devices,
    Scores,
    /// Sub-verbs: on, off
    Poll,
    /// Sub-verbs: on, off, status, reset
    Demo,
    Stats,
    SetSpeed,
    SetLevel,
    SetPoison,
    PrepareGame,
    StartGame,
    PauseGame,
    EndGame,
    SetSeed,
    /// Sub-verbs: start, end, status
    Tournament,
}

/// Verb table: (verb, kind, parameter count)
pub const COMMANDS: [(&str, CommandKind, usize); 21] = [
    ("@terminal", CommandKind::TerminalMode, 0),
    ("@pc_console", CommandKind::PcMode, 0),
    ("@scoreboard", CommandKind::ScoreboardMode, 0),
    ("@set_date", CommandKind::SetDate, 1),
    ("@set_time", CommandKind::SetTime, 1),
    ("@get_date", CommandKind::GetDate, 0),
    ("@get_time", CommandKind::GetTime, 0),
    ("@devices", CommandKind::Devices, 0),
    ("@scores", CommandKind::Scores, 0),
    ("@poll", CommandKind::Poll, 1),
    ("@demo", CommandKind::Demo, 1),
    ("@stats", CommandKind::Stats, 0),
    ("@set_speed", CommandKind::SetSpeed, 1),
    ("@set_level", CommandKind::SetLevel, 1),
    ("@set_poison", CommandKind::SetPoison, 1),
    ("@prepare_game", CommandKind::PrepareGame, 2),
    ("@start_game", CommandKind::StartGame, 1),
    ("@pause_game", CommandKind::PauseGame, 0),
    ("@end_game", CommandKind::EndGame, 0),
    ("@set_seed", CommandKind::SetSeed, 1),
    ("@tournament", CommandKind::Tournament, 1),
];

impl CommandKind {
    /// Look up a verb
    pub fn from_verb(verb: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(v, _, _)| *v == verb)
            .map(|&(_, kind, _)| kind)
    }

    fn entry(self) -> &'static (&'static str, CommandKind, usize) {
        // Every kind has exactly one table entry
        COMMANDS
            .iter()
            .find(|(_, kind, _)| *kind == self)
            .unwrap_or(&COMMANDS[0])
    }

    pub fn verb(self) -> &'static str {
        self.entry().0
    }

    /// Verb without the leading `@`
    pub fn name(self) -> &'static str {
        let verb = self.verb();
        verb.strip_prefix('@').unwrap_or(verb)
    }

    pub fn arity(self) -> usize {
        self.entry().2
    }

    /// Console opcode for commands that are forwarded to the consoles
    pub fn opcode(self) -> Option<Opcode> {
        match self {
            CommandKind::SetSpeed => Some(Opcode::SetSpeed),
            CommandKind::SetLevel => Some(Opcode::SetLevel),
            CommandKind::SetPoison => Some(Opcode::SetPoison),
            CommandKind::PrepareGame => Some(Opcode::PrepareGame),
            CommandKind::StartGame => Some(Opcode::StartGame),
            CommandKind::PauseGame => Some(Opcode::PauseGame),
            CommandKind::EndGame => Some(Opcode::EndGame),
            CommandKind::SetSeed => Some(Opcode::RandomSeed),
            _ => None,
        }
    }
}

/// Why a line could not be turned into a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Verb not in the command table
    UnknownCommand,
    /// Verb known but the parameter count differs from the table
    WrongParameterCount { expected: usize, found: usize },
}

/// Split a line into its verb and the trimmed parameter string
pub fn split(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(at) => (&line[..at], line[at..].trim()),
        None => (line, ""),
    }
}

/// Parse a command line
///
/// Returns the command and its parameters with surrounding whitespace
/// removed.
pub fn parse(line: &str) -> Result<(CommandKind, &str), ParseError> {
    let (verb, params) = split(line);
    let kind = CommandKind::from_verb(verb).ok_or(ParseError::UnknownCommand)?;

    let found = params.split_whitespace().count();
    let expected = kind.arity();
    if found != expected {
        return Err(ParseError::WrongParameterCount { expected, found });
    }

    Ok((kind, params))
}
