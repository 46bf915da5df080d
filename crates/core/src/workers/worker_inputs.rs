use std::sync::Arc;

use tokio::sync::{Notify, mpsc};

use crate::{events::EnrichedEvent, queues::FifoDropOldestReceiver};

pub enum FifoReceiver {
    FifoDropOldest(FifoDropOldestReceiver<Arc<EnrichedEvent>>),
    Isolated(mpsc::Receiver<Arc<EnrichedEvent>>),
}

pub struct FifoInput {
    pub event_type: &'static str,
    pub receiver: FifoReceiver,
}

/// All inboxes of one subscriber, sharing a single wake-up signal.
pub struct WorkerInputs {
    pub fifos: Vec<FifoInput>,
    pub notify_any: Arc<Notify>,
    pub fifo_index: usize,
}

pub struct WorkerItem {
    pub event_type: &'static str,
    pub event: Arc<EnrichedEvent>,
}

impl WorkerInputs {
    /// Next queued event, polling inputs round-robin so one busy input
    /// cannot starve the others.
    pub async fn next(&mut self) -> WorkerItem {
        loop {
            if !self.fifos.is_empty() {
                let start = self.fifo_index;

                loop {
                    let i = self.fifo_index;
                    self.fifo_index = (self.fifo_index + 1) % self.fifos.len();
                    let fifo = &mut self.fifos[i];

                    let item = match fifo.receiver {
                        FifoReceiver::FifoDropOldest(ref mut r) => r.try_recv(),
                        FifoReceiver::Isolated(ref mut r) => r.try_recv().ok(),
                    };

                    if let Some(e) = item {
                        return WorkerItem {
                            event_type: fifo.event_type,
                            event: e,
                        };
                    }

                    if self.fifo_index == start {
                        break;
                    }
                }
            }
            self.notify_any.notified().await;
        }
    }
}
