use std::{sync::Arc, time::SystemTime};

use lectern_core::{events::Event, segmenter::Segmentation, types::TranscriptLine};
use uuid::Uuid;

use crate::workers::events::{EventHeader, JobSpec};

#[derive(serde::Serialize)]
pub struct ChaptersSegmented {
    pub header: EventHeader,
    pub job: JobSpec,
    /// Shared with the upstream cleaned event, so the materializer reads the
    /// same lines the segmenter saw.
    pub lines: Arc<Vec<TranscriptLine>>,
    pub segmentation: Segmentation,
}

impl ChaptersSegmented {
    pub const EVENT_TYPE: &'static str = "chapters.segmented";

    pub fn new(
        parent_event_id: Uuid,
        job: JobSpec,
        lines: Arc<Vec<TranscriptLine>>,
        segmentation: Segmentation,
    ) -> Self {
        Self {
            header: EventHeader::child_of(parent_event_id),
            job,
            lines,
            segmentation,
        }
    }
}

impl Event for ChaptersSegmented {
    fn event_id(&self) -> Uuid {
        self.header.event_id
    }

    fn parent_ids(&self) -> &[Uuid] {
        &self.header.parent_ids
    }

    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn timestamp(&self) -> SystemTime {
        self.header.timestamp
    }

    fn job_id(&self) -> Uuid {
        self.job.job_id
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self as &dyn std::any::Any
    }
}
