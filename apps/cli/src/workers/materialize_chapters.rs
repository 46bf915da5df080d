use std::sync::Arc;

use lectern_core::{
    events::{EnrichedEvent, EventBus, expect},
    output::save_document,
    pipeline::document_from_segmentation,
    queues::QueueKind,
    workers::{InputSpec, SubscriptionSpec, Worker},
};
use tracing::info;

use crate::workers::events::{ChaptersMaterialized, ChaptersSegmented};

#[derive(Default)]
pub struct MaterializeChaptersWorker;

impl Worker for MaterializeChaptersWorker {
    const SUBSCRIBER_ID: &'static str = "chapters.materialize";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: ChaptersSegmented::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> anyhow::Result<()> {
        let req = expect::<ChaptersSegmented>(&event.event, ChaptersSegmented::EVENT_TYPE)?;

        let document = document_from_segmentation(&req.lines, req.segmentation.clone());
        let outputs = save_document(&document, &req.job.output_dir).await?;
        info!(
            job_id = %req.job.job_id,
            chapters = document.chapters.len(),
            dir = %req.job.output_dir.display(),
            "chapters written"
        );

        bus.publish(Arc::new(ChaptersMaterialized::new(
            event.event.event_id(),
            req.job.clone(),
            document,
            outputs,
        )));

        Ok(())
    }
}
