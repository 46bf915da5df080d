use std::sync::Arc;

use lectern_core::{
    events::{EnrichedEvent, EventBus, downcast_ref},
    jobs::JobStore,
    queues::QueueKind,
    workers::{InputSpec, JobFailed, SubscriptionSpec, Worker},
};
use tokio::sync::oneshot;

use crate::workers::events::ChaptersMaterialized;

pub type JobOutcome = Result<ChaptersMaterialized, JobFailed>;

/// Records the terminal state of the job and hands it to the waiting CLI.
pub struct CliCompletionSinkWorker {
    jobs: JobStore,
    done: Option<oneshot::Sender<JobOutcome>>,
}

impl CliCompletionSinkWorker {
    pub fn new(jobs: JobStore, done: oneshot::Sender<JobOutcome>) -> Self {
        Self {
            jobs,
            done: Some(done),
        }
    }

    fn finish(&mut self, outcome: JobOutcome) {
        if let Some(done) = self.done.take() {
            // The receiver is gone only if the CLI already gave up waiting.
            let _ = done.send(outcome);
        }
    }
}

impl Worker for CliCompletionSinkWorker {
    const SUBSCRIBER_ID: &'static str = "cli.completion_sink";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec {
                    event_type: ChaptersMaterialized::EVENT_TYPE,
                    queue_kind: QueueKind::Isolated { output_buffer: 4 },
                },
                InputSpec {
                    event_type: JobFailed::EVENT_TYPE,
                    queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
                },
            ],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        if let Some(done) = downcast_ref::<ChaptersMaterialized>(&event.event) {
            self.jobs
                .mark_completed(done.job.job_id, done.document.chapters.len());
            self.finish(Ok(done.clone()));
        } else if let Some(failed) = downcast_ref::<JobFailed>(&event.event) {
            self.jobs
                .mark_failed(failed.job_id, format!("{}: {}", failed.stage, failed.message));
            self.finish(Err(failed.clone()));
        }
        Ok(())
    }
}
