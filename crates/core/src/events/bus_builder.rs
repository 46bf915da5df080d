use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Result;
use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

use crate::{
    events::{EnrichedEvent, EventBus},
    queues::{FifoDropOldestQueue, IsolatedForwarder, QueueKind, StartupTasks},
    routes::{Route, RouteInbox, Routes},
    workers::{FifoInput, FifoReceiver, SubscriptionSpec, WorkerInputs, WorkerWiring},
};

pub struct BusConfig {
    pub session_id: Uuid,
    pub strict_routing: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            strict_routing: true,
        }
    }
}

#[derive(Default)]
pub struct BusMetrics {
    pub unrouted_publish_total: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unrouted(&self, _evt: &'static str) {
        self.unrouted_publish_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unrouted(&self) -> u64 {
        self.unrouted_publish_total.load(Ordering::Relaxed)
    }
}

fn validate(subs: &[SubscriptionSpec]) -> Result<()> {
    use std::collections::HashSet;

    let mut seen_subscribers: HashSet<&'static str> = HashSet::new();
    for s in subs {
        if s.subscriber_id.trim().is_empty() {
            anyhow::bail!("empty subscriber_id");
        }
        if !seen_subscribers.insert(s.subscriber_id) {
            anyhow::bail!("duplicate subscriber_id={}", s.subscriber_id);
        }
        if s.inputs.is_empty() {
            anyhow::bail!("subscriber_id={} has no inputs", s.subscriber_id);
        }

        let mut seen_inputs: HashSet<&'static str> = HashSet::new();
        for i in &s.inputs {
            if i.event_type.trim().is_empty() {
                anyhow::bail!("subscriber_id={} has empty event_type", s.subscriber_id);
            }
            if !seen_inputs.insert(i.event_type) {
                anyhow::bail!(
                    "subscriber_id={} has duplicate input event_type={}",
                    s.subscriber_id,
                    i.event_type
                );
            }

            match i.queue_kind {
                QueueKind::FifoDropOldest { capacity } => {
                    anyhow::ensure!(capacity > 0, "capacity must be > 0")
                }
                QueueKind::Isolated { output_buffer } => {
                    anyhow::ensure!(output_buffer > 0, "output_buffer must be > 0")
                }
            }
        }
    }
    Ok(())
}

pub struct EventBusBuilder {
    cfg: BusConfig,
    subs: Vec<SubscriptionSpec>,
}

impl EventBusBuilder {
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            subs: Vec::new(),
        }
    }

    pub fn subscribe(mut self, s: SubscriptionSpec) -> Self {
        self.subs.push(s);
        self
    }

    pub fn build(self) -> Result<(EventBus, WorkerWiring, StartupTasks)> {
        validate(&self.subs)?;

        let mut routes: HashMap<&'static str, Vec<Route>> = HashMap::new();
        let mut wiring: HashMap<&'static str, WorkerInputs> = HashMap::new();
        let mut tasks = StartupTasks { tokio: Vec::new() };
        let metrics = Arc::new(BusMetrics::new());

        for spec in self.subs {
            let notify_any = Arc::new(Notify::new());
            let mut fifos = Vec::new();

            for input in spec.inputs {
                let drops_total = Arc::new(AtomicU64::new(0));

                match input.queue_kind {
                    QueueKind::FifoDropOldest { capacity } => {
                        let q =
                            Arc::new(FifoDropOldestQueue::new(capacity, Arc::clone(&notify_any)));
                        routes.entry(input.event_type).or_default().push(Route {
                            subscriber_id: spec.subscriber_id,
                            inbox: RouteInbox::FifoDropOldest(Arc::clone(&q)),
                            drops_total: Arc::clone(&drops_total),
                        });
                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::FifoDropOldest(q.receiver()),
                        });
                    }
                    QueueKind::Isolated { output_buffer } => {
                        let (fwd, out_rx, drain_task) =
                            IsolatedForwarder::<Arc<EnrichedEvent>>::new(
                                output_buffer,
                                Arc::clone(&notify_any),
                            );
                        tasks.tokio.push(drain_task);

                        routes.entry(input.event_type).or_default().push(Route {
                            subscriber_id: spec.subscriber_id,
                            inbox: RouteInbox::Isolated(fwd),
                            drops_total: Arc::clone(&drops_total),
                        });

                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::Isolated(out_rx),
                        });
                    }
                }
                debug!(
                    subscriber = spec.subscriber_id,
                    event_type = input.event_type,
                    "route registered"
                );
            }

            wiring.insert(
                spec.subscriber_id,
                WorkerInputs {
                    fifos,
                    notify_any,
                    fifo_index: 0,
                },
            );
        }

        let bus = EventBus::new(self.cfg, Routes { table: routes }, metrics);
        Ok((bus, WorkerWiring::new(wiring), tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::InputSpec;

    fn spec(subscriber_id: &'static str, event_types: &[&'static str]) -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id,
            inputs: event_types
                .iter()
                .map(|&event_type| InputSpec {
                    event_type,
                    queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
                })
                .collect(),
        }
    }

    #[test]
    fn rejects_duplicate_subscribers() {
        let result = EventBusBuilder::new(BusConfig::default())
            .subscribe(spec("segment", &["transcript.cleaned"]))
            .subscribe(spec("segment", &["chapters.segmented"]))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_inputs_and_empty_subscriptions() {
        let duplicate = EventBusBuilder::new(BusConfig::default())
            .subscribe(spec("segment", &["transcript.cleaned", "transcript.cleaned"]))
            .build();
        assert!(duplicate.is_err());

        let empty = EventBusBuilder::new(BusConfig::default())
            .subscribe(spec("segment", &[]))
            .build();
        assert!(empty.is_err());
    }

    #[test]
    fn rejects_zero_capacity() {
        let result = EventBusBuilder::new(BusConfig::default())
            .subscribe(SubscriptionSpec {
                subscriber_id: "sink",
                inputs: vec![InputSpec {
                    event_type: "job.failed",
                    queue_kind: QueueKind::Isolated { output_buffer: 0 },
                }],
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn wiring_is_taken_once() {
        let (_bus, mut wiring, tasks) = EventBusBuilder::new(BusConfig::default())
            .subscribe(spec("segment", &["transcript.cleaned"]))
            .build()
            .unwrap();

        assert!(tasks.tokio.is_empty());
        assert!(wiring.take("segment").is_ok());
        assert!(wiring.take("segment").is_err());
    }
}
