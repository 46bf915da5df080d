use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    events::{EnrichedEvent, EventBus},
    workers::{JobFailed, SubscriptionSpec, WorkerInputs},
};

pub trait Worker: Send + Sized + 'static {
    const SUBSCRIBER_ID: &'static str;

    fn subscription() -> SubscriptionSpec;

    fn handle(
        &mut self,
        event: Arc<EnrichedEvent>,
        bus: &EventBus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drive the worker until shutdown. A failed `handle` publishes
    /// [`JobFailed`] for the job and the loop keeps going.
    fn run(
        mut self,
        mut inputs: WorkerInputs,
        bus: Arc<EventBus>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        debug!(worker = Self::SUBSCRIBER_ID, "shutdown");
                        return Ok(());
                    }
                    item = inputs.next() => {
                        debug!(worker = Self::SUBSCRIBER_ID, event_type = item.event_type, "handling");
                        let cause = Arc::clone(&item.event.event);
                        if let Err(e) = self.handle(item.event, &bus).await {
                            warn!(worker = Self::SUBSCRIBER_ID, error = %e, "stage failed");
                            bus.publish(Arc::new(JobFailed::new(&cause, Self::SUBSCRIBER_ID, format!("{e:#}"))));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, time::SystemTime};

    use serde::Serialize;
    use uuid::Uuid;

    use super::*;
    use crate::{
        events::{BusConfig, Event, EventBusBuilder, downcast_ref},
        queues::QueueKind,
        workers::InputSpec,
    };

    #[derive(Serialize)]
    struct Ping {
        id: Uuid,
        job_id: Uuid,
    }

    impl Event for Ping {
        fn event_id(&self) -> Uuid {
            self.id
        }

        fn parent_ids(&self) -> &[Uuid] {
            &[]
        }

        fn event_type(&self) -> &'static str {
            "test.ping"
        }

        fn timestamp(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH
        }

        fn job_id(&self) -> Uuid {
            self.job_id
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct RejectingWorker;

    impl Worker for RejectingWorker {
        const SUBSCRIBER_ID: &'static str = "test.rejecting";

        fn subscription() -> SubscriptionSpec {
            SubscriptionSpec {
                subscriber_id: Self::SUBSCRIBER_ID,
                inputs: vec![InputSpec {
                    event_type: "test.ping",
                    queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
                }],
            }
        }

        async fn handle(&mut self, _event: Arc<EnrichedEvent>, _bus: &EventBus) -> Result<()> {
            anyhow::bail!("chunk service offline")
        }
    }

    #[tokio::test]
    async fn failed_handle_publishes_job_failed() {
        let (bus, mut wiring, _tasks) = EventBusBuilder::new(BusConfig::default())
            .subscribe(RejectingWorker::subscription())
            .subscribe(SubscriptionSpec {
                subscriber_id: "test.sink",
                inputs: vec![InputSpec {
                    event_type: JobFailed::EVENT_TYPE,
                    queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
                }],
            })
            .build()
            .unwrap();
        let bus = Arc::new(bus);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut sink = wiring.take("test.sink").unwrap();

        let worker = tokio::spawn(RejectingWorker.run(
            wiring.take(RejectingWorker::SUBSCRIBER_ID).unwrap(),
            Arc::clone(&bus),
            shutdown_rx,
        ));

        let job_id = Uuid::new_v4();
        let ping_id = Uuid::new_v4();
        bus.publish(Arc::new(Ping { id: ping_id, job_id }));

        let item = sink.next().await;
        let failed = downcast_ref::<JobFailed>(&item.event.event).unwrap();
        assert_eq!(failed.job_id, job_id);
        assert_eq!(failed.parents, [ping_id]);
        assert_eq!(failed.stage, RejectingWorker::SUBSCRIBER_ID);
        assert_eq!(failed.message, "chunk service offline");

        shutdown_tx.send(()).unwrap();
        assert!(worker.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn unrouted_events_are_counted() {
        let (bus, _wiring, _tasks) = EventBusBuilder::new(BusConfig::default())
            .subscribe(RejectingWorker::subscription())
            .build()
            .unwrap();

        bus.publish(Arc::new(JobFailed {
            event_id: Uuid::new_v4(),
            ts: SystemTime::now(),
            parents: [Uuid::new_v4()],
            job_id: Uuid::new_v4(),
            stage: "test",
            message: "nobody listens".to_string(),
        }));
        assert_eq!(bus.metrics().unrouted(), 1);
    }
}
