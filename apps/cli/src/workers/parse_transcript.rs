use std::sync::Arc;

use lectern_core::{
    events::{EnrichedEvent, EventBus, expect},
    jobs::JobStore,
    pipeline::read_transcript,
    queues::QueueKind,
    transcript::LineParser,
    workers::{InputSpec, SubscriptionSpec, Worker},
};
use tracing::info;

use crate::workers::events::{TranscriptCleaned, TranscriptSubmitted};

pub struct ParseTranscriptWorker {
    parser: Arc<LineParser>,
    jobs: JobStore,
}

impl ParseTranscriptWorker {
    pub fn new(parser: Arc<LineParser>, jobs: JobStore) -> Self {
        Self { parser, jobs }
    }
}

impl Worker for ParseTranscriptWorker {
    const SUBSCRIBER_ID: &'static str = "transcript.parse";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: TranscriptSubmitted::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 16 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> anyhow::Result<()> {
        let req = expect::<TranscriptSubmitted>(&event.event, TranscriptSubmitted::EVENT_TYPE)?;
        self.jobs.mark_processing(req.job.job_id);

        let raw = read_transcript(&req.job.transcript_path).await?;
        let lines = self.parser.parse(&raw);
        info!(
            job_id = %req.job.job_id,
            lines = lines.len(),
            "transcript cleaned"
        );

        bus.publish(Arc::new(TranscriptCleaned::new(
            event.event.event_id(),
            req.job.clone(),
            Arc::new(lines),
        )));

        Ok(())
    }
}
