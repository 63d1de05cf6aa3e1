//! Response dialects
//!
//! One renderer per output mode. The dispatcher picks the renderer once per
//! command from the current mode, so a single response never mixes
//! dialects.
//!
//! | Dialect    | Success                        | Failure                                  |
//! |------------|--------------------------------|------------------------------------------|
//! | terminal   | `\r\n<prose>\r\n`              | `\r\n<message>\r\n`                      |
//! | pc         | `OK[\t<field>...]\n`           | `ERR\t<message>\n`                       |
//! | scoreboard | `{'<key>': <value>, 'status': 1}\n` | `{'error': '<message>', 'status': 0}\n` |

use core::fmt::{self, Write};

use tally_protocol::DeviceState;

use super::response::{on_off, DemoReply, ErrorReply, Response, TournamentReply};
use crate::scoreboard::state::{snake_name, AggregatorState, OutputMode};

/// Renders a [`Response`] in one dialect
pub trait ResponseSink {
    fn render(&self, response: &Response<'_>, out: &mut dyn Write) -> fmt::Result;
}

/// Renderer for `mode`
pub fn sink_for(mode: OutputMode) -> &'static dyn ResponseSink {
    match mode {
        OutputMode::Terminal => &TerminalDialect,
        OutputMode::Pc => &PcDialect,
        OutputMode::Scoreboard => &ScoreboardDialect,
    }
}

/// Human-readable prose for a serial terminal
pub struct TerminalDialect;

/// Tab-separated lines for a host program
pub struct PcDialect;

/// Record stream for the scoreboard display
pub struct ScoreboardDialect;

impl ResponseSink for TerminalDialect {
    fn render(&self, response: &Response<'_>, out: &mut dyn Write) -> fmt::Result {
        match response {
            Response::Mode(mode) => {
                let name = match mode {
                    OutputMode::Terminal => "Terminal",
                    OutputMode::Pc => "PC console",
                    OutputMode::Scoreboard => "Scoreboard",
                };
                write!(out, "\r\n{} mode enabled\r\n", name)
            }
            Response::DateSet(date) => write!(out, "\r\nDate set to {}\r\n", date),
            Response::TimeSet(time) => write!(out, "\r\nTime set to {}\r\n", time),
            Response::CurrentDate(date) => write!(out, "\r\nCurrent date: {}\r\n", date),
            Response::CurrentTime(time) => write!(out, "\r\nCurrent time: {}\r\n", time),
            Response::Devices(state) => {
                out.write_str("\r\nGaming Consoles:")?;
                for i in state.connected() {
                    write!(out, " {}", snake_name(state.states[i].console_id))?;
                }
                out.write_str("\r\n")
            }
            Response::Scores(state) => {
                write!(out, "\r\nScores: {}\r\n", state.connected_count())?;
                for i in state.connected() {
                    let s = &state.states[i];
                    // Terminal rows are numbered by slot, not console id
                    write!(
                        out,
                        "Console {}: Score1: {}, Score2: {}, Apples1: {}, Apples2: {}, Level: {}, Poison: {}, Mode: {}, Status: {}\r\n",
                        i,
                        s.score1,
                        s.score2,
                        s.apples1,
                        s.apples2,
                        s.level,
                        on_off(s.poison),
                        playing_mode(s),
                        s.status.label(),
                    )?;
                }
                Ok(())
            }
            Response::Stats(state) => {
                write!(out, "\r\nStats: {}\r\n", state.connected_count())?;
                for i in state.connected() {
                    let id = state.states[i].console_id;
                    for (difficulty, record) in each_record(state, i) {
                        write!(
                            out,
                            "Console {} {}: Apples: {}, High score: {}, Initials: {}\r\n",
                            id,
                            difficulty.label(),
                            record.apples,
                            record.high_score,
                            record.initials_str(),
                        )?;
                    }
                }
                Ok(())
            }
            Response::Polling(on) => write!(out, "\r\nPolling mode {}\r\n", on_off(*on)),
            Response::Demo(DemoReply::Switched(on)) => {
                write!(out, "\r\nDemo mode {}\r\n", on_off(*on))
            }
            Response::Demo(DemoReply::Status(on)) => {
                write!(out, "\r\nDemo mode: {}\r\n", on_off(*on))
            }
            Response::Demo(DemoReply::Reset) => out.write_str("\r\nDemo mode reset\r\n"),
            Response::Tournament(TournamentReply::Started) => {
                out.write_str("\r\nTournament started\r\n")
            }
            Response::Tournament(TournamentReply::Ended) => {
                out.write_str("\r\nTournament ended\r\n")
            }
            Response::Tournament(TournamentReply::Status(on)) => {
                write!(out, "\r\nTournament: {}\r\n", on_off(*on))
            }
            Response::Sent { kind, targets } => write!(
                out,
                "\r\nCommand {} sent to {} console(s)\r\n",
                kind.name(),
                targets
            ),
            Response::Error(error) => write!(out, "\r\n{}\r\n", error),
        }
    }
}

impl ResponseSink for PcDialect {
    fn render(&self, response: &Response<'_>, out: &mut dyn Write) -> fmt::Result {
        match response {
            Response::Mode(_) => out.write_str("OK\n"),
            Response::DateSet(date) | Response::CurrentDate(date) => {
                write!(out, "OK\t{}\n", date)
            }
            Response::TimeSet(time) | Response::CurrentTime(time) => {
                write!(out, "OK\t{}\n", time)
            }
            Response::Devices(state) => {
                write!(out, "OK\t{}", state.connected_count())?;
                for i in state.connected() {
                    write!(out, "\t{}", snake_name(state.states[i].console_id))?;
                }
                out.write_str("\n")
            }
            Response::Scores(state) => {
                write!(out, "OK\t{}\n", state.connected_count())?;
                for i in state.connected() {
                    let s = &state.states[i];
                    write!(
                        out,
                        "CONSOLE {}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                        s.console_id,
                        s.score1,
                        s.score2,
                        s.apples1,
                        s.apples2,
                        s.level,
                        s.poison as u8,
                        playing_mode(s),
                        s.status.to_bits(),
                        s.playing_time,
                    )?;
                }
                Ok(())
            }
            Response::Stats(state) => {
                write!(out, "OK\t{}\n", state.connected_count())?;
                for i in state.connected() {
                    let id = state.states[i].console_id;
                    for (difficulty, record) in each_record(state, i) {
                        write!(
                            out,
                            "STATS {}\t{}\t{}\t{}\t{}\n",
                            id,
                            difficulty.to_bits(),
                            record.apples,
                            record.high_score,
                            record.initials_str(),
                        )?;
                    }
                }
                Ok(())
            }
            Response::Polling(on) => write!(out, "OK\t{}\n", on_off(*on)),
            Response::Demo(DemoReply::Switched(on)) | Response::Demo(DemoReply::Status(on)) => {
                write!(out, "OK\t{}\n", on_off(*on))
            }
            Response::Demo(DemoReply::Reset) => out.write_str("OK\tDemo mode reset\n"),
            Response::Tournament(TournamentReply::Started) => out.write_str("OK\tstarted\n"),
            Response::Tournament(TournamentReply::Ended) => out.write_str("OK\tended\n"),
            Response::Tournament(TournamentReply::Status(on)) => {
                write!(out, "OK\t{}\n", on_off(*on))
            }
            Response::Sent { targets, .. } => write!(out, "OK\t{}\n", targets),
            Response::Error(error) => write!(out, "ERR\t{}\n", error),
        }
    }
}

impl ResponseSink for ScoreboardDialect {
    fn render(&self, response: &Response<'_>, out: &mut dyn Write) -> fmt::Result {
        match response {
            Response::Mode(mode) => write!(out, "{{'mode': '{}', 'status': 1}}\n", mode.label()),
            Response::DateSet(date) | Response::CurrentDate(date) => {
                write!(out, "{{'date': '{}', 'status': 1}}\n", date)
            }
            Response::TimeSet(time) | Response::CurrentTime(time) => {
                write!(out, "{{'time': '{}', 'status': 1}}\n", time)
            }
            Response::Devices(state) => {
                write!(
                    out,
                    "{{\"num_devices\": {}, \"devices\":[",
                    state.connected_count()
                )?;
                for (n, i) in state.connected().enumerate() {
                    if n > 0 {
                        out.write_str(",")?;
                    }
                    let id = state.states[i].console_id;
                    write!(
                        out,
                        "{{\"console_id\": {}, \"snake_name\": \"{}\"}}",
                        id,
                        snake_name(id)
                    )?;
                }
                out.write_str("]}\n")
            }
            Response::Scores(state) => {
                if state.connected_count() == 0 {
                    return out.write_str("{'consoles': 'none', 'status': 1}\n");
                }
                out.write_str("\r\n{\"consoles\": {\"console\":[")?;
                for (n, i) in state.connected().enumerate() {
                    if n > 0 {
                        out.write_str(",")?;
                    }
                    write_score_record(out, &state.states[i], state.slots[i].is_connected)?;
                }
                out.write_str("]}}\n")
            }
            Response::Stats(state) => {
                if state.connected_count() == 0 {
                    return out.write_str("{'stats': 'none', 'status': 1}\n");
                }
                out.write_str("{\"stats\":[")?;
                for (n, i) in state.connected().enumerate() {
                    if n > 0 {
                        out.write_str(",")?;
                    }
                    write!(out, "{{\"console_id\": {}", state.states[i].console_id)?;
                    for (difficulty, record) in each_record(state, i) {
                        write!(
                            out,
                            ", \"{}\": {{\"apples\": {}, \"high_score\": {}, \"initials\": \"{}\"}}",
                            difficulty.label(),
                            record.apples,
                            record.high_score,
                            record.initials_str(),
                        )?;
                    }
                    out.write_str("}")?;
                }
                out.write_str("]}\n")
            }
            Response::Polling(on) => {
                write!(out, "{{'polling': '{}', 'status': 1}}\n", on_off(*on))
            }
            Response::Demo(DemoReply::Switched(on)) | Response::Demo(DemoReply::Status(on)) => {
                write!(out, "{{'demo_mode': '{}', 'status': 1}}\n", on_off(*on))
            }
            Response::Demo(DemoReply::Reset) => {
                out.write_str("{'demo_mode': 'reset', 'status': 1}\n")
            }
            Response::Tournament(TournamentReply::Started) => {
                out.write_str("{'tournament': 'started', 'status': 1}\n")
            }
            Response::Tournament(TournamentReply::Ended) => {
                out.write_str("{'tournament': 'ended', 'status': 1}\n")
            }
            Response::Tournament(TournamentReply::Status(on)) => {
                write!(out, "{{'tournament': '{}', 'status': 1}}\n", on_off(*on))
            }
            Response::Sent { kind, targets } => write!(
                out,
                "{{'command': '{}', 'targets': {}, 'status': 1}}\n",
                kind.name(),
                targets
            ),
            Response::Error(error) => write!(out, "{{'error': '{}', 'status': 0}}\n", error),
        }
    }
}

fn write_score_record(out: &mut dyn Write, s: &DeviceState, connected: bool) -> fmt::Result {
    write!(
        out,
        "{{\"console_id\":{}, \"grid_size\":{}, \"clock_sync\": {}, \"game_status\": {}, \"game_difficulty\": {}, ",
        s.console_id,
        s.grid_size.to_bits(),
        s.clock_sync as u8,
        s.status.to_bits(),
        s.difficulty.to_bits(),
    )?;
    write!(
        out,
        "\"cause_of_death\": {}, \"game_speed\": {}, \"is_connected\": {}, \"score1\": {}, \"score2\": {}, ",
        s.cause_of_death.to_bits(),
        s.speed,
        connected as u8,
        s.score1,
        s.score2,
    )?;
    write!(
        out,
        "\"apples1\": {}, \"apples2\": {}, \"level\": {}, \"playing_mode\": {}, \"with_poison\": {}, ",
        s.apples1,
        s.apples2,
        s.level,
        playing_mode(s),
        s.poison as u8,
    )?;
    write!(out, "\"playing_time\": {}}}", s.playing_time)
}

/// Players column shared by every dialect: 1 for a two-player game
fn playing_mode(s: &DeviceState) -> u8 {
    s.two_players as u8
}

fn each_record(
    state: &AggregatorState,
    slot: usize,
) -> impl Iterator<Item = (tally_protocol::Difficulty, &tally_protocol::DifficultyRecord)> {
    tally_protocol::Difficulty::ALL
        .into_iter()
        .map(move |d| (d, state.stats[slot].record(d)))
}
