use std::sync::Arc;

use lectern_core::{
    events::{EnrichedEvent, EventBus, expect},
    queues::QueueKind,
    segmenter::Segmenter,
    workers::{InputSpec, SubscriptionSpec, Worker},
};

use crate::workers::events::{ChaptersSegmented, TranscriptCleaned};

pub struct SegmentChaptersWorker {
    segmenter: Arc<Segmenter>,
}

impl SegmentChaptersWorker {
    pub fn new(segmenter: Arc<Segmenter>) -> Self {
        Self { segmenter }
    }
}

impl Worker for SegmentChaptersWorker {
    const SUBSCRIBER_ID: &'static str = "chapters.segment";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: TranscriptCleaned::EVENT_TYPE,
                queue_kind: QueueKind::Isolated { output_buffer: 4 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> anyhow::Result<()> {
        let req = expect::<TranscriptCleaned>(&event.event, TranscriptCleaned::EVENT_TYPE)?;

        // Chunk failures are absorbed inside the segmenter; this stage never errors.
        let segmentation = self.segmenter.segment(&req.lines).await;

        bus.publish(Arc::new(ChaptersSegmented::new(
            event.event.event_id(),
            req.job.clone(),
            Arc::clone(&req.lines),
            segmentation,
        )));

        Ok(())
    }
}
