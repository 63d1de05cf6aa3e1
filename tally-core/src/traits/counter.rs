//! Free-running hardware counter

/// Monotonic counter used to seed the demo simulation
pub trait FreeRunningCounter {
    /// Current counter value; wraps freely
    fn now(&self) -> u32;
}
