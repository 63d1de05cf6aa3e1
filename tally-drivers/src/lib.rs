//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in tally-core:
//!
//! - Console bus over any blocking `embedded-hal` I2C controller
//! - Software calendar clock counting from a monotonic seconds source
//! - Blinking LED bank for the per-console indicators

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod clock;
pub mod indicator;
