//! Tally - Multi-console Scoreboard Aggregator Firmware
//!
//! Main firmware binary for STM32F411 "black pill" boards. Polls up to
//! five game consoles over I2C and serves their live state to an operator
//! over USART2.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::exti::{self, ExtiInput};
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::peripherals::USART2;
use embassy_stm32::usart::{self, Uart};
use embassy_time::Duration;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use tally_core::config::ScoreboardConfig;
use tally_core::scoreboard::Hardware;
use tally_drivers::bus::I2cDeviceBus;
use tally_drivers::clock::CalendarClock;
use tally_drivers::indicator::LedBank;

use crate::board::{ChannelIndicator, LedPin, PipeSerial, Uptime};
use crate::config::parse_config;

/// Embedded configuration (compiled into firmware)
/// Edit scoreboard.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../scoreboard.toml");

/// Operator link speed
const BAUD_RATE: u32 = 115_200;

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    USART2 => usart::InterruptHandler<USART2>;
    EXTI0 => exti::InterruptHandler<embassy_stm32::interrupt::typelevel::EXTI0>;
    EXTI1 => exti::InterruptHandler<embassy_stm32::interrupt::typelevel::EXTI1>;
    EXTI4 => exti::InterruptHandler<embassy_stm32::interrupt::typelevel::EXTI4>;
    EXTI9_5 => exti::InterruptHandler<embassy_stm32::interrupt::typelevel::EXTI9_5>;
});

// DMA ring for the UART receiver (must live forever)
static RX_DMA_BUF: StaticCell<[u8; 128]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tally firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Operator UART (PA2=TX, PA3=RX)
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = BAUD_RATE;

    let uart = Uart::new(
        p.USART2,
        p.PA3, // RX
        p.PA2, // TX
        Irqs,
        p.DMA1_CH6,
        p.DMA1_CH5,
        uart_config,
    )
    .unwrap();

    let (tx, rx) = uart.split();
    let rx = rx.into_ring_buffered(RX_DMA_BUF.init([0u8; 128]));
    info!("UART initialized at {} baud", BAUD_RATE);

    // Console bus (PB6=SCL, PB7=SDA)
    let mut i2c_config = i2c::Config::default();
    i2c_config.timeout = Duration::from_millis(config.bus_timeout_ms as u64);

    let i2c = I2c::new_blocking(p.I2C1, p.PB6, p.PB7, i2c_config);
    info!("I2C initialized, {} ms timeout", config.bus_timeout_ms);

    // Console LEDs, one per slot
    let leds = LedBank::new([
        LedPin(Output::new(p.PB12, Level::Low, Speed::Low)),
        LedPin(Output::new(p.PB13, Level::Low, Speed::Low)),
        LedPin(Output::new(p.PB14, Level::Low, Speed::Low)),
        LedPin(Output::new(p.PB15, Level::Low, Speed::Low)),
        LedPin(Output::new(p.PA8, Level::Low, Speed::Low)),
    ]);

    // Link-detect lines, pulled low by a connected console
    let links = [
        ExtiInput::new(p.PA0, p.EXTI0, Pull::Up, Irqs),
        ExtiInput::new(p.PA1, p.EXTI1, Pull::Up, Irqs),
        ExtiInput::new(p.PA4, p.EXTI4, Pull::Up, Irqs),
        ExtiInput::new(p.PA5, p.EXTI5, Pull::Up, Irqs),
        ExtiInput::new(p.PA6, p.EXTI6, Pull::Up, Irqs),
    ];

    // Black pill status LED is active low
    let status_led = Output::new(p.PC13, Level::High, Speed::Low);

    let hw = Hardware {
        bus: I2cDeviceBus::new(i2c),
        clock: CalendarClock::new(Uptime, config.baseline_date, config.baseline_time),
        serial: PipeSerial,
        indicator: ChannelIndicator,
        counter: Uptime,
    };

    // Spawn tasks
    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner.spawn(tasks::indicator_task(leds)).unwrap();
    spawner.spawn(tasks::link_monitor_task(links)).unwrap();
    spawner.spawn(tasks::heartbeat_task(status_led)).unwrap();
    spawner.spawn(tasks::scoreboard_task(hw, config)).unwrap();

    info!("All tasks spawned");
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> ScoreboardConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Configuration loaded: refresh every {} ms, rescan every {} refreshes",
                config.refresh_interval_ms(),
                config.rescan_refreshes
            );
            config
        }
        Err(e) => {
            warn!("Invalid embedded configuration ({:?}), using defaults", e);
            ScoreboardConfig::default()
        }
    }
}
