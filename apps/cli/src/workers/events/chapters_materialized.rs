use std::time::SystemTime;

use lectern_core::{events::Event, output::SavedOutputs, pipeline::ChapterDocument};
use uuid::Uuid;

use crate::workers::events::{EventHeader, JobSpec};

#[derive(Clone, serde::Serialize)]
pub struct ChaptersMaterialized {
    pub header: EventHeader,
    pub job: JobSpec,
    pub document: ChapterDocument,
    pub outputs: SavedOutputs,
}

impl ChaptersMaterialized {
    pub const EVENT_TYPE: &'static str = "chapters.materialized";

    pub fn new(
        parent_event_id: Uuid,
        job: JobSpec,
        document: ChapterDocument,
        outputs: SavedOutputs,
    ) -> Self {
        Self {
            header: EventHeader::child_of(parent_event_id),
            job,
            document,
            outputs,
        }
    }
}

impl Event for ChaptersMaterialized {
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
