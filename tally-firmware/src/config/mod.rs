//! Configuration loading and parsing
//!
//! The configuration is compiled in from scoreboard.toml and parsed at
//! startup by a small no_std parser. build.rs has already validated it, so
//! a parse failure here falls back to the defaults.

pub mod toml;

pub use toml::{parse_config, ConfigParseError};
