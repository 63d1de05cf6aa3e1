//! Blinking LED bank
//!
//! One LED per console slot. A blink request sets a period and a number of
//! flashes; [`LedBank::update`] advances every channel by the elapsed time
//! and drives the pins. Each flash is one period: on for the first half,
//! off for the second.

use tally_core::traits::Indicator;

/// Trait for GPIO pin abstraction
pub trait OutputPin {
    /// Set the pin high
    fn set_high(&mut self);

    /// Set the pin low
    fn set_low(&mut self);
}

/// Blink progress of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkState {
    period_ms: u16,
    /// Flashes left, including the current one
    remaining: u8,
    /// Time into the current flash
    elapsed_ms: u16,
}

impl BlinkState {
    /// Start `count` flashes of `period_ms`, replacing any blink in progress
    pub fn start(&mut self, period_ms: u16, count: u8) {
        *self = if period_ms == 0 {
            Self::default()
        } else {
            Self {
                period_ms,
                remaining: count,
                elapsed_ms: 0,
            }
        };
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// LED level right now
    pub fn is_lit(&self) -> bool {
        self.is_active() && self.elapsed_ms < self.period_ms / 2
    }

    /// Advance by `delta_ms`
    pub fn advance(&mut self, delta_ms: u16) {
        if !self.is_active() {
            return;
        }
        let mut elapsed = self.elapsed_ms as u32 + delta_ms as u32;
        let period = self.period_ms as u32;
        while elapsed >= period && self.remaining > 0 {
            elapsed -= period;
            self.remaining -= 1;
        }
        self.elapsed_ms = if self.remaining > 0 { elapsed as u16 } else { 0 };
    }
}

/// LEDs driven by blink requests
pub struct LedBank<P, const C: usize> {
    pins: [P; C],
    states: [BlinkState; C],
}

impl<P: OutputPin, const C: usize> LedBank<P, C> {
    /// Take the pins and switch every LED off
    pub fn new(pins: [P; C]) -> Self {
        let mut bank = Self {
            pins,
            states: [BlinkState::default(); C],
        };
        bank.drive();
        bank
    }

    /// True while any channel is still blinking
    pub fn is_busy(&self) -> bool {
        self.states.iter().any(BlinkState::is_active)
    }

    /// Advance all channels and update the pins
    pub fn update(&mut self, delta_ms: u16) {
        for state in self.states.iter_mut() {
            state.advance(delta_ms);
        }
        self.drive();
    }

    fn drive(&mut self) {
        for (pin, state) in self.pins.iter_mut().zip(self.states.iter()) {
            if state.is_lit() {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
    }
}

impl<P: OutputPin, const C: usize> Indicator for LedBank<P, C> {
    fn set_blink(&mut self, channel: usize, period_ms: u16, count: u8) {
        // Unknown channels are ignored
        if let Some(state) = self.states.get_mut(channel) {
            state.start(period_ms, count);
        }
        self.drive();
    }
}
