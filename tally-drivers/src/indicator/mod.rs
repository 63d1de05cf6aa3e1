//! Indicator light implementations

pub mod blink;

pub use blink::{BlinkState, LedBank, OutputPin};
