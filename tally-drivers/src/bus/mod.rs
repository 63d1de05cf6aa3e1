//! Console bus implementations

pub mod i2c;

pub use i2c::{I2cDeviceBus, MAX_WRITE_LEN};
