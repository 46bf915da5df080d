use std::{path::PathBuf, time::SystemTime};

use lectern_core::events::Event;
use uuid::Uuid;

use crate::workers::events::EventHeader;

/// What a chaptering job was asked to do.
#[derive(Clone, Debug, serde::Serialize)]
pub struct JobSpec {
    pub job_id: Uuid,
    pub transcript_path: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(serde::Serialize)]
pub struct TranscriptSubmitted {
    pub header: EventHeader,
    pub job: JobSpec,
}

impl TranscriptSubmitted {
    pub const EVENT_TYPE: &'static str = "transcript.submitted";

    pub fn new(job: JobSpec) -> Self {
        Self {
            header: EventHeader::root(),
            job,
        }
    }
}

impl Event for TranscriptSubmitted {
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
