//! Receive byte buffer
//!
//! The serial receive path is the only producer and the scoreboard loop
//! the only consumer. [`SharedRingBuffer`] makes each operation (and the
//! consumer's line extraction as a whole) atomic with respect to that pair.

pub mod ring;
pub mod shared;

pub use ring::{BufferError, RingBuffer};
pub use shared::SharedRingBuffer;
