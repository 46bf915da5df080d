use std::collections::HashMap;

use anyhow::Result;

use crate::{queues::QueueKind, workers::WorkerInputs};

pub struct SubscriptionSpec {
    pub subscriber_id: &'static str,
    pub inputs: Vec<InputSpec>,
}

pub struct InputSpec {
    pub event_type: &'static str,
    pub queue_kind: QueueKind,
}

pub struct WorkerWiring {
    inputs: HashMap<&'static str, WorkerInputs>,
}

impl WorkerWiring {
    pub fn new(inputs: HashMap<&'static str, WorkerInputs>) -> Self {
        Self { inputs }
    }

    /// Hand a subscriber its inputs. Each subscriber can be taken once.
    pub fn take(&mut self, subscriber_id: &'static str) -> Result<WorkerInputs> {
        self.inputs
            .remove(subscriber_id)
            .ok_or_else(|| anyhow::anyhow!("no wiring for subscriber_id={subscriber_id}"))
    }
}
