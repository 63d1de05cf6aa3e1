//! Status indicator trait

/// Blinking status lights, one channel per console slot
///
/// Calls only hand over blink parameters; the blinking itself runs
/// elsewhere.
pub trait Indicator {
    /// Blink `channel` `count` times with the given period
    fn set_blink(&mut self, channel: usize, period_ms: u16, count: u8);
}
