//! Console bus over a blocking I2C controller
//!
//! Each console is a 7-bit target. Register access uses the usual pointer
//! protocol: write the register offset, then read or keep writing.
//!
//! ```text
//! read:   S addr+W offset  Sr addr+R data.. P
//! write:  S addr+W offset data.. P
//! ```
//!
//! Transaction timeouts are the controller's business; this wrapper only
//! maps whatever it reports onto [`BusError`]. `embedded-hal` has no
//! timeout error kind, so a controller timeout surfaces as
//! [`BusError::Other`].

use embedded_hal::i2c::{Error, ErrorKind, I2c};
use heapless::Vec;
use tally_core::traits::{BusError, DeviceBus};

/// Longest payload a single register write may carry
pub const MAX_WRITE_LEN: usize = 8;

/// [`DeviceBus`] over any `embedded-hal` I2C controller
pub struct I2cDeviceBus<I> {
    i2c: I,
}

impl<I: I2c> I2cDeviceBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give back the controller
    pub fn release(self) -> I {
        self.i2c
    }
}

fn bus_error<E: Error>(e: E) -> BusError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
        ErrorKind::Bus => BusError::Bus,
        ErrorKind::Overrun => BusError::Overrun,
        _ => BusError::Other,
    }
}

impl<I: I2c> DeviceBus for I2cDeviceBus<I> {
    fn is_device_ready(&mut self, address: u8) -> bool {
        // One-byte read: some controllers cannot issue an empty write
        let mut probe = [0u8; 1];
        self.i2c.read(address, &mut probe).is_ok()
    }

    fn read_registers(&mut self, address: u8, offset: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(address, &[offset], buf)
            .map_err(bus_error)
    }

    fn write_registers(&mut self, address: u8, offset: u8, data: &[u8]) -> Result<(), BusError> {
        let mut frame: Vec<u8, { MAX_WRITE_LEN + 1 }> = Vec::new();
        frame.push(offset).map_err(|_| BusError::TooLong)?;
        frame
            .extend_from_slice(data)
            .map_err(|_| BusError::TooLong)?;

        self.i2c.write(address, &frame).map_err(bus_error)
    }
}
