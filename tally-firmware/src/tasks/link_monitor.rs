//! Console link-detect monitor
//!
//! Each console pulls its link-detect line when plugged in. Any edge on
//! any line asks the scoreboard loop for a bus rescan.

use defmt::*;
use embassy_futures::select::select_array;
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Timer};

use crate::board::CONSOLE_COUNT;
use crate::channels::LINK_CHANGED;

/// Settling time after an edge; connectors bounce
const DEBOUNCE_MS: u64 = 50;

#[embassy_executor::task]
pub async fn link_monitor_task(mut links: [ExtiInput<'static>; CONSOLE_COUNT]) {
    info!("Link monitor task started");

    loop {
        let ((), line) = select_array(links.each_mut().map(|l| l.wait_for_any_edge())).await;
        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;

        debug!("Link line {} changed", line);
        LINK_CHANGED.signal(());
    }
}
