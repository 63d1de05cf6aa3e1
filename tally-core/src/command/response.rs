//! Dialect-neutral command responses

use core::fmt;

use tally_protocol::{Date, Time};

use super::parser::CommandKind;
use crate::scoreboard::state::{AggregatorState, OutputMode};

/// Outcome of a command, rendered by a [`ResponseSink`](super::dialect::ResponseSink)
#[derive(Debug, Clone, Copy)]
pub enum Response<'a> {
    /// Output mode switched
    Mode(OutputMode),
    DateSet(Date),
    TimeSet(Time),
    CurrentDate(Date),
    CurrentTime(Time),
    /// Connected console listing
    Devices(&'a AggregatorState),
    /// Live score listing
    Scores(&'a AggregatorState),
    /// Per-difficulty records listing
    Stats(&'a AggregatorState),
    Polling(bool),
    Demo(DemoReply),
    Tournament(TournamentReply),
    /// Command forwarded to `targets` consoles
    Sent { kind: CommandKind, targets: usize },
    Error(ErrorReply<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoReply {
    /// Demo mode switched on or off
    Switched(bool),
    Status(bool),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentReply {
    Started,
    Ended,
    Status(bool),
}

/// Operator-facing error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReply<'a> {
    /// Unknown verb (carries the verb as typed)
    InvalidCommand(&'a str),
    WrongParameterCount(&'a str),
    InvalidDate,
    InvalidTime,
    ClockUnavailable,
    InvalidPollingMode,
    InvalidDemoMode,
    InvalidTournamentMode,
    /// Parameters out of range; nothing was sent
    InvalidParameters(CommandKind),
    /// Input line exceeded the line buffer
    LineTooLong,
    /// Input line was not valid text
    InvalidEncoding,
}

impl fmt::Display for ErrorReply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReply::InvalidCommand(verb) => write!(f, "Invalid command: {}", verb),
            ErrorReply::WrongParameterCount(verb) => {
                write!(f, "Wrong number of parameters: {}", verb)
            }
            ErrorReply::InvalidDate => f.write_str("Invalid date"),
            ErrorReply::InvalidTime => f.write_str("Invalid time"),
            ErrorReply::ClockUnavailable => f.write_str("Clock unavailable"),
            ErrorReply::InvalidPollingMode => f.write_str("Invalid polling mode"),
            ErrorReply::InvalidDemoMode => f.write_str("Invalid demo mode"),
            ErrorReply::InvalidTournamentMode => f.write_str("Invalid tournament mode"),
            ErrorReply::InvalidParameters(kind) => {
                write!(f, "Invalid parameters for {}, not sent", kind.name())
            }
            ErrorReply::LineTooLong => f.write_str("Line too long"),
            ErrorReply::InvalidEncoding => f.write_str("Invalid characters in command"),
        }
    }
}

/// `on`/`off` for a flag
pub(crate) fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
