//! Board glue
//!
//! Binds the core hardware traits to STM32F411 peripherals and to the
//! channels that feed the I/O tasks.

use defmt::*;
use embassy_stm32::gpio::Output;
use embassy_stm32::i2c::{I2c, Master};
use embassy_stm32::mode::Blocking;
use embassy_sync::pipe::TryWriteError;
use embassy_time::Instant;

use tally_core::scoreboard::Board;
use tally_core::traits::{FreeRunningCounter, Indicator, SerialError, SerialTx};
use tally_drivers::bus::I2cDeviceBus;
use tally_drivers::clock::{CalendarClock, SecondsSource};
use tally_drivers::indicator::OutputPin;

use crate::channels::{BlinkRequest, BLINK_CHANNEL, TX_PIPE};

/// Console count on this board; one LED and one link-detect line each
pub const CONSOLE_COUNT: usize = 5;

/// Blocking I2C master shared by all consoles
pub type ConsoleI2c = I2c<'static, Blocking, Master>;

/// The scoreboard's view of this board
pub struct TallyBoard;

impl Board for TallyBoard {
    type Bus = I2cDeviceBus<ConsoleI2c>;
    type Clock = CalendarClock<Uptime>;
    type Serial = PipeSerial;
    type Indicator = ChannelIndicator;
    type Counter = Uptime;
}

/// Time since boot from the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct Uptime;

impl SecondsSource for Uptime {
    fn seconds(&self) -> u64 {
        Instant::now().as_secs()
    }
}

impl FreeRunningCounter for Uptime {
    fn now(&self) -> u32 {
        Instant::now().as_ticks() as u32
    }
}

/// Operator output into [`TX_PIPE`]
///
/// Never waits: a full pipe is reported as overflow and the rest of the
/// write is lost.
#[derive(Debug, Default)]
pub struct PipeSerial;

impl SerialTx for PipeSerial {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut rest = bytes;
        while !rest.is_empty() {
            match TX_PIPE.try_write(rest) {
                Ok(n) => rest = &rest[n..],
                Err(TryWriteError::Full) => return Err(SerialError::Overflow),
            }
        }
        Ok(())
    }
}

/// Forwards blink requests to the indicator task
#[derive(Debug, Default)]
pub struct ChannelIndicator;

impl Indicator for ChannelIndicator {
    fn set_blink(&mut self, channel: usize, period_ms: u16, count: u8) {
        let request = BlinkRequest {
            channel,
            period_ms,
            count,
        };
        if BLINK_CHANNEL.try_send(request).is_err() {
            warn!("Blink channel full, dropping request for LED {}", channel);
        }
    }
}

/// Console LED, lit when high
pub struct LedPin(pub Output<'static>);

impl OutputPin for LedPin {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }
}
