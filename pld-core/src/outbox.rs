//! Bounded queue of outgoing reply lines
//!
//! Components push replies during a control pass; the transport drains them
//! afterwards. When the queue is full new replies are dropped and counted.

use heapless::Deque;
use pld_protocol::Reply;

/// Replies buffered per control pass
pub const OUTBOX_CAPACITY: usize = 32;

/// Fixed-capacity reply queue
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Deque<Reply, OUTBOX_CAPACITY>,
    dropped: u32,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply, dropping it if the queue is full
    pub fn push(&mut self, reply: Reply) {
        if self.queue.push_back(reply).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    /// Oldest queued reply
    pub fn pop(&mut self) -> Option<Reply> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of replies dropped since the last call, resetting the count
    pub fn take_dropped(&mut self) -> u32 {
        core::mem::take(&mut self.dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut outbox = Outbox::new();
        outbox.push(Reply::TeachDone);
        outbox.push(Reply::LaserDone);
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.pop(), Some(Reply::TeachDone));
        assert_eq!(outbox.pop(), Some(Reply::LaserDone));
        assert_eq!(outbox.pop(), None);
    }

    #[test]
    fn test_overflow_is_counted() {
        let mut outbox = Outbox::new();
        for _ in 0..OUTBOX_CAPACITY + 3 {
            outbox.push(Reply::Busy);
        }
        assert_eq!(outbox.len(), OUTBOX_CAPACITY);
        assert_eq!(outbox.take_dropped(), 3);
        assert_eq!(outbox.take_dropped(), 0);
    }
}
