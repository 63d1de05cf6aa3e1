//! Board-agnostic core logic for the scoreboard aggregator
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (device bus, clock, serial, indicator)
//! - Receive ring buffer shared between the serial producer and the loop
//! - Command parser, dispatcher and the three response dialects
//! - Aggregator state, bus orchestration, demo simulation and tournaments
//! - Configuration type definitions
//!
//! Nothing in here logs. Operations return reports and errors that the
//! firmware turns into defmt output.

#![no_std]
#![deny(unsafe_code)]

pub mod buffer;
pub mod command;
pub mod config;
pub mod scoreboard;
pub mod traits;
