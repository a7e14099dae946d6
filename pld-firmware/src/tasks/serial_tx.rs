//! Serial transmit task
//!
//! Renders replies as text lines on the host link.

use core::fmt::Write as _;

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;
use heapless::String;

use crate::channels::REPLY_CHANNEL;

/// Longest rendered reply, terminator included
const LINE_CAPACITY: usize = 128;

/// Serial TX task - writes one line per reply
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx) {
    info!("Serial TX task started");

    let mut line: String<LINE_CAPACITY> = String::new();

    loop {
        let reply = REPLY_CHANNEL.receive().await;

        line.clear();
        if write!(line, "{}\r\n", reply).is_err() {
            warn!("Reply too long, truncated");
            line.clear();
            let _ = line.push_str("ERR: reply truncated\r\n");
        }

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
