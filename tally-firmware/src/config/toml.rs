//! Simple TOML parser for the scoreboard configuration
//!
//! Handles only the subset scoreboard.toml uses. It does NOT support the
//! full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer)
//! - [section] headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Dotted keys

use tally_core::config::ScoreboardConfig;
use tally_core::scoreboard::OutputMode;
use tally_protocol::{Date, Time};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value of the wrong type or out of range
    InvalidValue,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Loop,
    Serial,
    Clock,
    Bus,
    Indicator,
}

/// Parse TOML text into a [`ScoreboardConfig`]
///
/// Keys that are absent keep their defaults.
pub fn parse_config(input: &str) -> Result<ScoreboardConfig, ConfigParseError> {
    let mut config = ScoreboardConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        match parse_key_value(line) {
            Some((key, value)) => apply_value(section, key, value, &mut config)?,
            None => return Err(ConfigParseError::InvalidValue),
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigParseError> {
    match header.trim() {
        "loop" => Ok(Section::Loop),
        "serial" => Ok(Section::Serial),
        "clock" => Ok(Section::Clock),
        "bus" => Ok(Section::Bus),
        "indicator" => Ok(Section::Indicator),
        _ => Err(ConfigParseError::InvalidSection),
    }
}

/// Parse a key = value line, dropping any trailing comment
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    let value = match value.find('#') {
        // A # inside quotes is part of the string
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Strip surrounding quotes
fn parse_string(value: &str) -> Result<&str, ConfigParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ConfigParseError::InvalidValue)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigParseError> {
    value.parse().map_err(|_| ConfigParseError::InvalidValue)
}

/// Integer that must be at least `min`
fn parse_at_least(value: &str, min: u16) -> Result<u16, ConfigParseError> {
    let v = parse_int::<u16>(value)?;
    if v < min {
        return Err(ConfigParseError::InvalidValue);
    }
    Ok(v)
}

fn parse_mode(value: &str) -> Result<OutputMode, ConfigParseError> {
    match parse_string(value)? {
        "terminal" => Ok(OutputMode::Terminal),
        "pc_console" => Ok(OutputMode::Pc),
        "scoreboard" => Ok(OutputMode::Scoreboard),
        _ => Err(ConfigParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut ScoreboardConfig,
) -> Result<(), ConfigParseError> {
    match (section, key) {
        (Section::Loop, "quantum_ms") => config.quantum_ms = parse_at_least(value, 1)?,
        (Section::Loop, "first_refresh_quanta") => {
            config.first_refresh_quanta = parse_at_least(value, 1)?
        }
        (Section::Loop, "refresh_quanta") => config.refresh_quanta = parse_at_least(value, 1)?,
        (Section::Loop, "rescan_refreshes") => config.rescan_refreshes = parse_int(value)?,
        (Section::Serial, "default_mode") => config.default_mode = parse_mode(value)?,
        (Section::Clock, "baseline_date") => {
            config.baseline_date =
                Date::parse(parse_string(value)?).ok_or(ConfigParseError::InvalidValue)?
        }
        (Section::Clock, "baseline_time") => {
            config.baseline_time =
                Time::parse(parse_string(value)?).ok_or(ConfigParseError::InvalidValue)?
        }
        (Section::Bus, "timeout_ms") => config.bus_timeout_ms = parse_at_least(value, 1)?,
        (Section::Indicator, "blink_period_ms") => {
            config.blink_period_ms = parse_at_least(value, 2)?
        }
        (Section::Indicator, "blink_count") => config.blink_count = parse_int(value)?,
        _ => return Err(ConfigParseError::UnknownKey),
    }
    Ok(())
}
