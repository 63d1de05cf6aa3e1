//! Operator UART transmit task

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartTx;
use embedded_io_async::Write;

use crate::channels::TX_PIPE;

const WRITE_CHUNK: usize = 64;

/// Serial TX task - drains the transmit pipe to the UART
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: UartTx<'static, Async>) {
    info!("Serial TX task started");

    let mut buf = [0u8; WRITE_CHUNK];

    loop {
        let n = TX_PIPE.read(&mut buf).await;
        if let Err(e) = tx.write_all(&buf[..n]).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
