//! Status LED heartbeat

use defmt::*;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Ticker};

/// Half period of the status blink
const HEARTBEAT_MS: u64 = 500;

#[embassy_executor::task]
pub async fn heartbeat_task(mut led: Output<'static>) {
    info!("Heartbeat task started");

    let mut ticker = Ticker::every(Duration::from_millis(HEARTBEAT_MS));

    loop {
        ticker.next().await;
        led.toggle();
    }
}
