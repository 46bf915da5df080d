use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    /// Transcript path or URL the job was submitted with.
    pub source: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub chapter_count: Option<usize>,
}

/// Shared job state, keyed by job id. Cloning shares the same table.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<DashMap<Uuid, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, source: impl Into<String>) -> JobRecord {
        let record = JobRecord {
            id: Uuid::new_v4(),
            source: source.into(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            failed_at: None,
            error: None,
            chapter_count: None,
        };
        self.jobs.insert(record.id, record.clone());
        record
    }

    pub fn mark_processing(&self, id: Uuid) -> bool {
        self.update(id, |job| job.status = JobStatus::Processing)
    }

    pub fn mark_completed(&self, id: Uuid, chapter_count: usize) -> bool {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.chapter_count = Some(chapter_count);
        })
    }

    pub fn mark_failed(&self, id: Uuid, error: impl Into<String>) -> bool {
        let error = error.into();
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.failed_at = Some(Utc::now());
            job.error = Some(error);
        })
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.get(&id).map(|job| job.value().clone())
    }

    fn update(&self, id: Uuid, apply: impl FnOnce(&mut JobRecord)) -> bool {
        match self.jobs.get_mut(&id) {
            Some(mut job) => {
                apply(job.value_mut());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_lifecycle_to_completion() {
        let store = JobStore::new();
        let job = store.create("lecture.txt");
        assert_eq!(job.status, JobStatus::Pending);

        assert!(store.mark_processing(job.id));
        assert_eq!(store.get(job.id).unwrap().status, JobStatus::Processing);

        assert!(store.mark_completed(job.id, 7));
        let done = store.get(job.id).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.chapter_count, Some(7));
        assert!(done.completed_at.is_some());
        assert!(done.error.is_none());
    }

    #[test]
    fn failure_records_error() {
        let store = JobStore::new();
        let job = store.create("missing.txt");

        assert!(store.mark_failed(job.id, "Transcript not found: missing.txt"));
        let failed = store.get(job.id).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("Transcript not found: missing.txt"));
        assert!(failed.failed_at.is_some());
    }

    #[test]
    fn clones_share_state_and_unknown_ids_are_ignored() {
        let store = JobStore::new();
        let shared = store.clone();
        let job = store.create("a");

        assert!(shared.mark_processing(job.id));
        assert_eq!(store.get(job.id).unwrap().status, JobStatus::Processing);
        assert!(!store.mark_processing(Uuid::new_v4()));
        assert!(store.get(Uuid::new_v4()).is_none());
    }
}
