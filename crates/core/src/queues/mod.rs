pub mod fifo_drop_oldest_queue;
pub mod isolated_forwarder;

pub use fifo_drop_oldest_queue::*;
pub use isolated_forwarder::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// Bounded ring; a full queue evicts its oldest entry.
    FifoDropOldest { capacity: usize },
    /// Dedicated drain task feeding a bounded channel; never evicts, but the
    /// publish side drops when the forwarder inbox is full.
    Isolated { output_buffer: usize },
}
