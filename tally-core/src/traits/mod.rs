//! Hardware abstraction traits
//!
//! These traits define the interface between the scoreboard logic
//! and hardware-specific implementations.

pub mod bus;
pub mod clock;
pub mod counter;
pub mod indicator;
pub mod serial;

pub use bus::{BusError, DeviceBus};
pub use clock::{Clock, ClockError};
pub use counter::FreeRunningCounter;
pub use indicator::Indicator;
pub use serial::{SerialError, SerialTx, SerialWriter};
