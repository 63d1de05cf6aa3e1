//! Console LED task
//!
//! Owns the LED bank and advances every blink on a fixed tick.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use tally_core::traits::Indicator;
use tally_drivers::indicator::LedBank;

use crate::board::{LedPin, CONSOLE_COUNT};
use crate::channels::BLINK_CHANNEL;

/// Blink resolution
const TICK_MS: u16 = 10;

#[embassy_executor::task]
pub async fn indicator_task(mut leds: LedBank<LedPin, CONSOLE_COUNT>) {
    info!("Indicator task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_MS as u64));

    loop {
        match select(BLINK_CHANNEL.receive(), ticker.next()).await {
            Either::First(request) => {
                trace!("Blink request: {:?}", request);
                leds.set_blink(request.channel, request.period_ms, request.count);
            }
            Either::Second(()) => leds.update(TICK_MS),
        }
    }
}
