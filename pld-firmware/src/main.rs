//! PLD controller firmware
//!
//! Drives the target carousel of a pulsed laser deposition chamber and
//! triggers the excimer laser, under line-based text commands from the
//! host GUI on the serial port.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pld_core::config::MachineConfig;
use pld_core::Controller;
use pld_drivers::laser::LaserOutputs;
use pld_drivers::sensor::LightGate;
use pld_drivers::stepper::AccelStepper;

use crate::config::parse_config;

/// Embedded configuration (compiled into firmware)
/// Edit machine.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../machine.toml");

/// Host link speed, fixed by the GUI
const HOST_BAUD: u32 = 9600;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("PLD firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Motion: {} steps/s, {} steps/s^2, pulse width {} ms",
        config.motion.max_speed, config.motion.acceleration, config.laser.pulse_width_ms
    );

    // Host link (UART0: TX=GPIO0, RX=GPIO1)
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = HOST_BAUD;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    // RS485 transceiver held in receive; the link is run as plain RS232
    let _de_re = Output::new(p.PIN_2, Level::Low);

    info!("UART initialized at {} baud", HOST_BAUD);

    // Pin assignments are board-specific (SKR Pico: STEP=GPIO11, DIR=GPIO10,
    // ENABLE=GPIO12, light gate on the X endstop GPIO4)
    let stepper = AccelStepper::new(
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_12, Level::High),
        config.motion.max_speed,
        config.motion.acceleration,
    );
    let gate = LightGate::new(Input::new(p.PIN_4, Pull::Down));

    // Laser trigger, supply relay and alarm buzzer on the fan/heater outputs
    let laser = LaserOutputs::new(
        Output::new(p.PIN_17, Level::Low),
        Output::new(p.PIN_23, Level::Low),
        Output::new(p.PIN_18, Level::Low),
    );

    info!("Stage and laser outputs initialized");

    let stage = Controller::new(stepper, gate, laser, config);

    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner.spawn(tasks::control_task(stage)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded machine.toml, falling back to built-in defaults
fn load_config() -> MachineConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            // build.rs rejects a bad machine.toml, so this only happens when
            // the two readers disagree
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in defaults");
            MachineConfig::default()
        }
    }
}
