//! Serial receive task
//!
//! Assembles command lines from the host link and queues them for the
//! control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use pld_protocol::{LineParser, Rejection, Reply};

use crate::channels::{COMMAND_CHANNEL, REPLY_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - splits the byte stream into lines
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx) {
    info!("Serial RX task started");

    let mut parser = LineParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(line)) => {
                            debug!("Line: {}", line.as_str());
                            // Backpressure: wait for the control task rather than drop commands
                            COMMAND_CHANNEL.send(line).await;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Line discarded: {:?}", e);
                            if REPLY_CHANNEL
                                .try_send(Reply::Rejected(Rejection::LineDiscarded))
                                .is_err()
                            {
                                warn!("Reply channel full, dropping line error");
                            }
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
                parser.reset();
            }
        }
    }
}
