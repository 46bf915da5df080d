pub mod chapters_materialized;
pub mod chapters_segmented;
pub mod transcript_cleaned;
pub mod transcript_submitted;

pub use chapters_materialized::*;
pub use chapters_segmented::*;
pub use transcript_cleaned::*;
pub use transcript_submitted::*;

use std::time::SystemTime;

use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize)]
pub struct EventHeader {
    pub event_id: Uuid,
    pub parent_ids: Vec<Uuid>,
    pub timestamp: SystemTime,
}

impl EventHeader {
    pub fn root() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            parent_ids: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn child_of(parent_event_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            parent_ids: vec![parent_event_id],
            timestamp: SystemTime::now(),
        }
    }
}
