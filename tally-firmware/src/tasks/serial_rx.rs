//! Operator UART receive task
//!
//! Sole producer of the receive ring buffer. Bytes are stored as they
//! arrive; line framing happens in the scoreboard loop.

use defmt::*;
use embassy_stm32::usart::RingBufferedUartRx;
use embassy_time::{Duration, Timer};
use embedded_io_async::Read;

use crate::channels::RX_BUFFER;

/// Bytes pulled from the UART per read
const READ_CHUNK: usize = 32;

/// Attempts to store a byte into a full buffer before dropping it
const ENQUEUE_RETRIES: u32 = 10;

/// Wait between attempts
const ENQUEUE_RETRY_MS: u64 = 50;

/// Serial RX task - moves received bytes into the ring buffer
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: RingBufferedUartRx<'static>) {
    info!("Serial RX task started");

    let mut buf = [0u8; READ_CHUNK];

    loop {
        match Read::read(&mut rx, &mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    store(byte).await;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Enqueue one byte, giving the consumer time to drain a full buffer
async fn store(byte: u8) {
    for _ in 0..ENQUEUE_RETRIES {
        if RX_BUFFER.enqueue(byte).is_ok() {
            return;
        }
        Timer::after(Duration::from_millis(ENQUEUE_RETRY_MS)).await;
    }
    warn!(
        "RX buffer full, dropping byte ({} overflows)",
        RX_BUFFER.overflows()
    );
}
