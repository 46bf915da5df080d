use std::{any::Any, sync::Arc, time::SystemTime};

use serde::Serialize;
use uuid::Uuid;

use crate::events::Event;

/// Published by the worker loop when a stage returns an error.
#[derive(Clone, Debug, Serialize)]
pub struct JobFailed {
    pub event_id: Uuid,
    pub ts: SystemTime,
    pub parents: [Uuid; 1],
    pub job_id: Uuid,
    pub stage: &'static str,
    pub message: String,
}

impl JobFailed {
    pub const EVENT_TYPE: &'static str = "job.failed";

    pub fn new(cause: &Arc<dyn Event>, stage: &'static str, message: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            ts: SystemTime::now(),
            parents: [cause.event_id()],
            job_id: cause.job_id(),
            stage,
            message,
        }
    }
}

impl Event for JobFailed {
    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn parent_ids(&self) -> &[Uuid] {
        &self.parents
    }

    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn timestamp(&self) -> SystemTime {
        self.ts
    }

    fn job_id(&self) -> Uuid {
        self.job_id
    }

    fn as_any(&self) -> &dyn Any {
        self as &dyn Any
    }
}
