//! Console bus trait

/// Errors reported by a bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Target did not acknowledge its address or data
    Nack,
    /// Transaction did not complete within the bus timeout
    Timeout,
    /// Another controller won arbitration
    ArbitrationLost,
    /// Misplaced start/stop or other bus-level fault
    Bus,
    /// Data was lost because it was not serviced in time
    Overrun,
    /// Write payload longer than the implementation can frame
    TooLong,
    /// Any other failure
    Other,
}

/// Register-oriented access to the consoles on the shared bus
///
/// Every call is blocking and must be bounded by a short fixed timeout. A
/// timed out transaction fails; implementations that can tell timeouts
/// apart report [`BusError::Timeout`], others fall back to
/// [`BusError::Other`].
pub trait DeviceBus {
    /// Check whether a target acknowledges `address`
    fn is_device_ready(&mut self, address: u8) -> bool;

    /// Read `buf.len()` bytes starting at register `offset`
    fn read_registers(&mut self, address: u8, offset: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Write `data` starting at register `offset`
    fn write_registers(&mut self, address: u8, offset: u8, data: &[u8]) -> Result<(), BusError>;
}
