//! Inter-task communication channels
//!
//! The serial tasks and the control task share nothing but these queues.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use pld_protocol::{Line, Reply};

/// Channel capacity for assembled command lines
pub const COMMAND_CHANNEL_SIZE: usize = 8;

/// Channel capacity for outgoing replies
const REPLY_CHANNEL_SIZE: usize = 32;

/// Complete command lines from the serial port
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Line, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Replies waiting to be written to the serial port
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, Reply, REPLY_CHANNEL_SIZE> =
    Channel::new();
