//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;

use tally_core::buffer::SharedRingBuffer;

/// Receive ring buffer capacity (bytes)
pub const RX_BUFFER_SIZE: usize = 256;

/// Transmit pipe capacity (bytes)
pub const TX_PIPE_SIZE: usize = 1024;

/// Channel capacity for blink requests
const BLINK_CHANNEL_SIZE: usize = 8;

pub type RxBuffer = SharedRingBuffer<CriticalSectionRawMutex, RX_BUFFER_SIZE>;

/// Request to flash one console LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkRequest {
    pub channel: usize,
    pub period_ms: u16,
    pub count: u8,
}

/// Operator input, filled by the serial RX task
pub static RX_BUFFER: RxBuffer = SharedRingBuffer::new();

/// Operator output, drained to the UART by the serial TX task
pub static TX_PIPE: Pipe<CriticalSectionRawMutex, TX_PIPE_SIZE> = Pipe::new();

/// Blink requests from the scoreboard loop to the indicator task
pub static BLINK_CHANNEL: Channel<CriticalSectionRawMutex, BlinkRequest, BLINK_CHANNEL_SIZE> =
    Channel::new();

/// A console link-detect line changed level
pub static LINK_CHANGED: Signal<CriticalSectionRawMutex, ()> = Signal::new();
