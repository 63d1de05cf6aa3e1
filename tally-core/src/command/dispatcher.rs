//! Command execution
//!
//! Each call mutates the aggregator state, renders exactly one response in
//! the current dialect and tells the orchestrator whether anything has to
//! go out on the bus. Nothing is kept between calls.

use core::fmt::Write;

use tally_protocol::{Date, DeviceCommand, GameStatus, Time};

use super::dialect::sink_for;
use super::parser::{self, CommandKind, ParseError};
use super::response::{DemoReply, ErrorReply, Response, TournamentReply};
use crate::scoreboard::state::{AggregatorState, OutputMode};
use crate::traits::{Clock, ClockError};

/// What the orchestrator must do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Nothing beyond the response
    None,
    /// Write this command to every active console
    Transmit(DeviceCommand),
}

/// Command failures; all are reported to the operator before returning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Line did not match the command table
    Parse(ParseError),
    /// Sub-verb, date or time not understood
    InvalidArgument,
    /// Console command parameters out of range; nothing transmitted
    Rejected,
    /// Clock refused the new value
    Clock(ClockError),
    /// Line did not fit the line buffer
    LineTooLong,
    /// Line was not valid UTF-8
    InvalidEncoding,
}

/// Render `response` in the dialect of the current mode
///
/// Transport errors surface through the writer (see
/// [`SerialWriter::error`](crate::traits::SerialWriter::error)).
pub fn respond(state: &AggregatorState, out: &mut dyn Write, response: Response<'_>) {
    let _ = sink_for(state.mode).render(&response, out);
}

/// Report a line-level failure that happened before parsing
pub fn reject_line(state: &AggregatorState, out: &mut dyn Write, error: CommandError) -> CommandError {
    let reply = match error {
        CommandError::LineTooLong => ErrorReply::LineTooLong,
        _ => ErrorReply::InvalidEncoding,
    };
    respond(state, out, Response::Error(reply));
    error
}

/// Parse and execute one input line
pub fn dispatch_line<C: Clock>(
    state: &mut AggregatorState,
    line: &str,
    clock: &mut C,
    out: &mut dyn Write,
) -> Result<Effect, CommandError> {
    match parser::parse(line) {
        Ok((kind, params)) => execute(state, kind, params, clock, out),
        Err(error) => {
            let (verb, _) = parser::split(line);
            let reply = match error {
                ParseError::UnknownCommand => ErrorReply::InvalidCommand(verb),
                ParseError::WrongParameterCount { .. } => ErrorReply::WrongParameterCount(verb),
            };
            respond(state, out, Response::Error(reply));
            Err(CommandError::Parse(error))
        }
    }
}

/// Execute a parsed command
pub fn execute<C: Clock>(
    state: &mut AggregatorState,
    kind: CommandKind,
    params: &str,
    clock: &mut C,
    out: &mut dyn Write,
) -> Result<Effect, CommandError> {
    let response = match kind {
        CommandKind::TerminalMode => set_mode(state, OutputMode::Terminal),
        CommandKind::PcMode => set_mode(state, OutputMode::Pc),
        CommandKind::ScoreboardMode => set_mode(state, OutputMode::Scoreboard),

        CommandKind::SetDate => {
            let Some(date) = Date::parse(params) else {
                return fail(state, out, ErrorReply::InvalidDate, CommandError::InvalidArgument);
            };
            if let Err(e) = clock.set_date(date) {
                return fail(state, out, ErrorReply::ClockUnavailable, CommandError::Clock(e));
            }
            Response::DateSet(date)
        }
        CommandKind::SetTime => {
            let Some(time) = Time::parse(params) else {
                return fail(state, out, ErrorReply::InvalidTime, CommandError::InvalidArgument);
            };
            if let Err(e) = clock.set_time(time) {
                return fail(state, out, ErrorReply::ClockUnavailable, CommandError::Clock(e));
            }
            Response::TimeSet(time)
        }
        CommandKind::GetDate => Response::CurrentDate(clock.date()),
        CommandKind::GetTime => Response::CurrentTime(clock.time()),

        CommandKind::Devices => {
            respond(state, out, Response::Devices(state));
            return Ok(Effect::None);
        }
        CommandKind::Scores => {
            respond(state, out, Response::Scores(state));
            return Ok(Effect::None);
        }
        CommandKind::Stats => {
            respond(state, out, Response::Stats(state));
            return Ok(Effect::None);
        }

        CommandKind::Poll => match params {
            "on" | "off" => {
                state.polling = params == "on";
                Response::Polling(state.polling)
            }
            _ => {
                return fail(
                    state,
                    out,
                    ErrorReply::InvalidPollingMode,
                    CommandError::InvalidArgument,
                )
            }
        },
        CommandKind::Demo => match params {
            "on" | "off" => {
                state.demo_mode = params == "on";
                Response::Demo(DemoReply::Switched(state.demo_mode))
            }
            "status" => Response::Demo(DemoReply::Status(state.demo_mode)),
            "reset" => {
                reset_scores(state);
                Response::Demo(DemoReply::Reset)
            }
            _ => {
                return fail(
                    state,
                    out,
                    ErrorReply::InvalidDemoMode,
                    CommandError::InvalidArgument,
                )
            }
        },
        CommandKind::Tournament => match params {
            "start" => {
                state.tournament_active = true;
                Response::Tournament(TournamentReply::Started)
            }
            "end" => {
                state.tournament_active = false;
                respond(state, out, Response::Tournament(TournamentReply::Ended));
                return Ok(Effect::Transmit(DeviceCommand::TournamentEnd));
            }
            "status" => Response::Tournament(TournamentReply::Status(state.tournament_active)),
            _ => {
                return fail(
                    state,
                    out,
                    ErrorReply::InvalidTournamentMode,
                    CommandError::InvalidArgument,
                )
            }
        },

        CommandKind::SetSpeed
        | CommandKind::SetLevel
        | CommandKind::SetPoison
        | CommandKind::PrepareGame
        | CommandKind::StartGame
        | CommandKind::PauseGame
        | CommandKind::EndGame
        | CommandKind::SetSeed => {
            let command = kind
                .opcode()
                .and_then(|opcode| DeviceCommand::parse(opcode, params));
            let Some(command) = command else {
                return fail(
                    state,
                    out,
                    ErrorReply::InvalidParameters(kind),
                    CommandError::Rejected,
                );
            };
            let targets = state.active_count();
            respond(state, out, Response::Sent { kind, targets });
            return Ok(Effect::Transmit(command));
        }
    };

    respond(state, out, response);
    Ok(Effect::None)
}

fn fail(
    state: &AggregatorState,
    out: &mut dyn Write,
    reply: ErrorReply<'_>,
    error: CommandError,
) -> Result<Effect, CommandError> {
    respond(state, out, Response::Error(reply));
    Err(error)
}

fn set_mode(state: &mut AggregatorState, mode: OutputMode) -> Response<'static> {
    state.mode = mode;
    Response::Mode(mode)
}

/// Zero every slot's game progress
fn reset_scores(state: &mut AggregatorState) {
    for s in state.states.iter_mut() {
        s.score1 = 0;
        s.score2 = 0;
        s.apples1 = 0;
        s.apples2 = 0;
        s.level = 1;
        s.poison = false;
        s.two_players = false;
        s.status = GameStatus::Stopped;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::String;
    use tally_protocol::Difficulty;

    /// Mock clock for testing
    struct MockClock {
        date: Date,
        time: Time,
        fail: bool,
    }

    impl MockClock {
        fn new() -> Self {
            Self {
                date: Date::new(2024, 1, 1).unwrap(),
                time: Time::new(23, 59, 30).unwrap(),
                fail: false,
            }
        }
    }

    impl Clock for MockClock {
        fn date(&mut self) -> Date {
            self.date
        }

        fn time(&mut self) -> Time {
            self.time
        }

        fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
            if self.fail {
                return Err(ClockError::Unavailable);
            }
            self.date = date;
            Ok(())
        }

        fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
            if self.fail {
                return Err(ClockError::Unavailable);
            }
            self.time = time;
            Ok(())
        }
    }

    fn run(state: &mut AggregatorState, line: &str) -> (Result<Effect, CommandError>, String) {
        let mut clock = MockClock::new();
        let mut out = String::new();
        let result = dispatch_line(state, line, &mut clock, &mut out);
        (result, out)
    }

    #[test]
    fn test_mode_switch_answers_in_new_dialect() {
        let mut state = AggregatorState::default();
        let (result, out) = run(&mut state, "@terminal");
        assert_eq!(result, Ok(Effect::None));
        assert_eq!(state.mode, OutputMode::Terminal);
        assert_eq!(out, "\r\nTerminal mode enabled\r\n");

        let (_, out) = run(&mut state, "@pc_console");
        assert_eq!(out, "OK\n");
    }

    #[test]
    fn test_unknown_command_reports_verb() {
        let mut state = AggregatorState::new(OutputMode::Pc);
        let (result, out) = run(&mut state, "@bogus 1 2");
        assert_eq!(result, Err(CommandError::Parse(ParseError::UnknownCommand)));
        assert_eq!(out, "ERR\tInvalid command: @bogus\n");
    }

    #[test]
    fn test_wrong_parameter_count() {
        let mut state = AggregatorState::default();
        let (result, out) = run(&mut state, "@set_speed");
        assert!(matches!(
            result,
            Err(CommandError::Parse(ParseError::WrongParameterCount { .. }))
        ));
        assert_eq!(
            out,
            "{'error': 'Wrong number of parameters: @set_speed', 'status': 0}\n"
        );
    }

    #[test]
    fn test_set_and_get_date() {
        let mut state = AggregatorState::new(OutputMode::Terminal);
        let mut clock = MockClock::new();
        let mut out = String::new();

        let result = dispatch_line(&mut state, "@set_date 2025-07-04", &mut clock, &mut out);
        assert_eq!(result, Ok(Effect::None));
        assert_eq!(out, "\r\nDate set to 2025-07-04\r\n");

        out.clear();
        dispatch_line(&mut state, "@get_date", &mut clock, &mut out).unwrap();
        assert_eq!(out, "\r\nCurrent date: 2025-07-04\r\n");
    }

    #[test]
    fn test_invalid_date_leaves_clock() {
        let mut state = AggregatorState::new(OutputMode::Pc);
        let mut clock = MockClock::new();
        let mut out = String::new();

        let result = dispatch_line(&mut state, "@set_date 2024-02-30", &mut clock, &mut out);
        assert_eq!(result, Err(CommandError::InvalidArgument));
        assert_eq!(out, "ERR\tInvalid date\n");
        assert_eq!(clock.date, Date::new(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_clock_failure_reported() {
        let mut state = AggregatorState::new(OutputMode::Scoreboard);
        let mut clock = MockClock::new();
        clock.fail = true;
        let mut out = String::new();

        let result = dispatch_line(&mut state, "@set_time 10:00:00", &mut clock, &mut out);
        assert_eq!(result, Err(CommandError::Clock(ClockError::Unavailable)));
        assert_eq!(out, "{'error': 'Clock unavailable', 'status': 0}\n");
    }

    #[test]
    fn test_get_time_scoreboard() {
        let mut state = AggregatorState::default();
        let (_, out) = run(&mut state, "@get_time");
        assert_eq!(out, "{'time': '23:59:30', 'status': 1}\n");
    }

    #[test]
    fn test_poll_toggle() {
        let mut state = AggregatorState::new(OutputMode::Pc);
        let (_, out) = run(&mut state, "@poll on");
        assert!(state.polling);
        assert_eq!(out, "OK\ton\n");

        let (result, out) = run(&mut state, "@poll maybe");
        assert_eq!(result, Err(CommandError::InvalidArgument));
        assert!(state.polling);
        assert_eq!(out, "ERR\tInvalid polling mode\n");
    }

    #[test]
    fn test_demo_subverbs() {
        let mut state = AggregatorState::new(OutputMode::Terminal);
        run(&mut state, "@demo on");
        assert!(state.demo_mode);

        let (_, out) = run(&mut state, "@demo status");
        assert_eq!(out, "\r\nDemo mode: on\r\n");

        state.states[1].score1 = 500;
        state.states[1].status = GameStatus::Over;
        state.states[1].two_players = true;
        state.states[1].difficulty = Difficulty::Insane;
        let (_, out) = run(&mut state, "@demo reset");
        assert_eq!(out, "\r\nDemo mode reset\r\n");
        assert_eq!(state.states[1].score1, 0);
        assert_eq!(state.states[1].level, 1);
        assert_eq!(state.states[1].status, GameStatus::Stopped);
        assert!(!state.states[1].two_players);
        assert_eq!(state.states[1].difficulty, Difficulty::Insane);

        let (result, _) = run(&mut state, "@demo sideways");
        assert_eq!(result, Err(CommandError::InvalidArgument));
    }

    #[test]
    fn test_device_command_is_forwarded() {
        let mut state = AggregatorState::new(OutputMode::Pc);
        state.slots[0].is_active = true;
        state.slots[4].is_active = true;

        let (result, out) = run(&mut state, "@prepare_game 2 1");
        assert_eq!(
            result,
            Ok(Effect::Transmit(DeviceCommand::PrepareGame {
                level: 2,
                poison: true
            }))
        );
        assert_eq!(out, "OK\t2\n");
    }

    #[test]
    fn test_out_of_range_command_is_not_forwarded() {
        let mut state = AggregatorState::new(OutputMode::Terminal);
        let (result, out) = run(&mut state, "@set_speed 150");
        assert_eq!(result, Err(CommandError::Rejected));
        assert_eq!(out, "\r\nInvalid parameters for set_speed, not sent\r\n");
    }

    #[test]
    fn test_tournament_end_transmits() {
        let mut state = AggregatorState::default();
        run(&mut state, "@tournament start");
        assert!(state.tournament_active);

        let (result, out) = run(&mut state, "@tournament end");
        assert_eq!(result, Ok(Effect::Transmit(DeviceCommand::TournamentEnd)));
        assert!(!state.tournament_active);
        assert_eq!(out, "{'tournament': 'ended', 'status': 1}\n");
    }

    #[test]
    fn test_devices_with_no_consoles() {
        let mut state = AggregatorState::default();
        let (result, out) = run(&mut state, "@devices");
        assert_eq!(result, Ok(Effect::None));
        assert_eq!(out, "{\"num_devices\": 0, \"devices\":[]}\n");
    }

    #[test]
    fn test_reject_line() {
        let state = AggregatorState::new(OutputMode::Pc);
        let mut out = String::new();
        let err = reject_line(&state, &mut out, CommandError::LineTooLong);
        assert_eq!(err, CommandError::LineTooLong);
        assert_eq!(out, "ERR\tLine too long\n");
    }
}
