use std::sync::Arc;

use anyhow::Result;
use lectern_core::{
    events::{BusConfig, EventBus, EventBusBuilder},
    jobs::JobStore,
    segmenter::Segmenter,
    transcript::LineParser,
    workers::Worker,
};
use tokio::sync::{broadcast, oneshot};
use tracing::debug;

use crate::workers::{
    cli_completion_sink::{CliCompletionSinkWorker, JobOutcome},
    materialize_chapters::MaterializeChaptersWorker,
    parse_transcript::ParseTranscriptWorker,
    segment_chapters::SegmentChaptersWorker,
};

pub struct PipelineHandle {
    pub bus: Arc<EventBus>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub done_rx: oneshot::Receiver<JobOutcome>,
}

/// Wire the chaptering stages onto a fresh bus and start their workers.
pub async fn start_pipeline(
    bus_config: BusConfig,
    parser: Arc<LineParser>,
    segmenter: Arc<Segmenter>,
    jobs: JobStore,
) -> Result<PipelineHandle> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (done_tx, done_rx) = oneshot::channel::<JobOutcome>();

    let builder = EventBusBuilder::new(bus_config)
        .subscribe(ParseTranscriptWorker::subscription())
        .subscribe(SegmentChaptersWorker::subscription())
        .subscribe(MaterializeChaptersWorker::subscription())
        .subscribe(CliCompletionSinkWorker::subscription());

    let (bus, mut wiring, tasks) = builder.build()?;
    let arc_bus = Arc::new(bus);
    debug!(session_id = %arc_bus.session_id(), "event bus ready");

    // start isolated drain tasks BEFORE sources publish anything
    for t in tasks.tokio {
        tokio::spawn(t);
    }

    tokio::spawn(ParseTranscriptWorker::new(parser, jobs.clone()).run(
        wiring.take(ParseTranscriptWorker::SUBSCRIBER_ID)?,
        arc_bus.clone(),
        shutdown_rx.resubscribe(),
    ));
    tokio::spawn(SegmentChaptersWorker::new(segmenter).run(
        wiring.take(SegmentChaptersWorker::SUBSCRIBER_ID)?,
        arc_bus.clone(),
        shutdown_rx.resubscribe(),
    ));
    tokio::spawn(MaterializeChaptersWorker.run(
        wiring.take(MaterializeChaptersWorker::SUBSCRIBER_ID)?,
        arc_bus.clone(),
        shutdown_rx.resubscribe(),
    ));
    tokio::spawn(CliCompletionSinkWorker::new(jobs, done_tx).run(
        wiring.take(CliCompletionSinkWorker::SUBSCRIBER_ID)?,
        arc_bus.clone(),
        shutdown_rx.resubscribe(),
    ));
    debug!("workers started");

    Ok(PipelineHandle {
        bus: arc_bus,
        shutdown_tx,
        done_rx,
    })
}
