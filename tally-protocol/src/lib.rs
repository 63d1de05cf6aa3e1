//! Tally Console Register Protocol
//!
//! This crate defines the register map shared by the scoreboard controller
//! and the snake game consoles on the I2C bus, plus the 32-bit command word
//! the controller writes to steer them.
//!
//! # Protocol Overview
//!
//! Each console is an I2C target at a fixed address and exposes one flat
//! register file:
//! ```text
//! ┌──────────────┬─────────────┬────────────┬──────────┬──────────┬─────────┐
//! │ STATUS BYTES │ SCORES/TIME │ STATS      │ INITIALS │ DATETIME │ COMMAND │
//! │ 4B           │ 12B         │ 16B        │ 12B      │ 4B       │ 4B      │
//! └──────────────┴─────────────┴────────────┴──────────┴──────────┴─────────┘
//! ```
//!
//! The controller reads the whole file to refresh its view of a console
//! and writes only the command word. Field widths, shifts and byte order
//! are part of the wire contract with the console firmware.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod datetime;
pub mod fields;
pub mod register;
pub mod types;

pub use command::{encode_command, opcode_bits, DeviceCommand, Opcode, OPCODE_MASK, OPCODE_SHIFT};
pub use datetime::{Date, DateTime, Time};
pub use fields::{ConsoleInfo, GameState, GameState2, GameState3};
pub use register::{
    decode, encode, DeviceState, DeviceStats, DifficultyRecord, RegisterError, RegisterFile,
    RegisterImage, COMMAND_OFFSET, REGISTER_FILE_SIZE,
};
pub use types::{CauseOfDeath, Difficulty, GameStatus, GridSize};
