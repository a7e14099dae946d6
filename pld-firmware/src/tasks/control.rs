//! Control loop task
//!
//! Runs the controller as fast as the executor allows. Each pass drains
//! every command line that has arrived, then advances the state machine, the
//! stepper and the laser sequencer once, then forwards replies.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::{Input, Output};
use embassy_time::Instant;
use heapless::Vec;

use pld_core::Controller;
use pld_drivers::laser::LaserOutputs;
use pld_drivers::sensor::LightGate;
use pld_drivers::stepper::AccelStepper;
use pld_protocol::Line;

use crate::channels::{COMMAND_CHANNEL, COMMAND_CHANNEL_SIZE, REPLY_CHANNEL};

/// Controller wired to the RP2040 pins
pub type Stage = Controller<
    AccelStepper<Output<'static>, Output<'static>, Output<'static>>,
    LightGate<Input<'static>>,
    LaserOutputs<Output<'static>, Output<'static>, Output<'static>>,
>;

#[embassy_executor::task]
pub async fn control_task(mut stage: Stage) {
    info!("Control task started");

    // Sized to the channel so one pass always empties it
    let mut lines: Vec<Line, COMMAND_CHANNEL_SIZE> = Vec::new();
    let mut last_state = stage.state();

    loop {
        lines.clear();
        // No await while draining, so the channel cannot refill past the buffer
        while let Ok(line) = COMMAND_CHANNEL.try_receive() {
            let _ = lines.push(line);
        }

        let now_us = Instant::now().as_micros();
        stage.run_pass(lines.iter().map(|line| line.as_str()), now_us);

        let state = stage.state();
        if state != last_state {
            debug!("State: {} -> {}", last_state.name(), state.name());
            last_state = state;
        }

        // Replies stay queued in the controller while the TX side catches up
        while REPLY_CHANNEL.free_capacity() > 0 {
            let Some(reply) = stage.pop_reply() else {
                break;
            };
            let _ = REPLY_CHANNEL.try_send(reply);
        }

        let dropped = stage.take_dropped_replies();
        if dropped > 0 {
            warn!("Reply queue overflow, {} replies dropped", dropped);
        }

        yield_now().await;
    }
}
