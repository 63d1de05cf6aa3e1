//! Serial transmit trait

use core::fmt;

/// Errors writing to the operator link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Transmit queue is full; the bytes were dropped
    Overflow,
    /// No host is listening
    Disconnected,
}

/// Byte transmitter towards the operator
pub trait SerialTx {
    /// Queue `bytes` for transmission
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError>;

    /// Borrow as a [`fmt::Write`] sink
    fn writer(&mut self) -> SerialWriter<'_, Self>
    where
        Self: Sized,
    {
        SerialWriter {
            tx: self,
            error: None,
        }
    }
}

/// [`fmt::Write`] adapter over a [`SerialTx`]
///
/// Remembers the first transmit error so callers can tell a formatting
/// failure from a full transmit queue.
pub struct SerialWriter<'a, T: SerialTx> {
    tx: &'a mut T,
    error: Option<SerialError>,
}

impl<T: SerialTx> SerialWriter<'_, T> {
    /// First transmit error seen, if any
    pub fn error(&self) -> Option<SerialError> {
        self.error
    }
}

impl<T: SerialTx> fmt::Write for SerialWriter<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.write(s.as_bytes()).map_err(|e| {
            self.error.get_or_insert(e);
            fmt::Error
        })
    }
}
