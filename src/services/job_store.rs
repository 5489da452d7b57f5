use crate::types::{CollectionInfo, DownloadedFile, JobId, TrackDescriptor};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub(crate) enum JobStoreError {
    #[error("Job has not been found in the store")]
    JobNotFound,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TrackOutcome {
    Completed,
    Failed,
}

/// One entry per attempted track, in sweep order.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub(crate) struct TrackAttempt {
    #[serde(flatten)]
    pub(crate) track: TrackDescriptor,
    pub(crate) status: TrackOutcome,
}

/// Server-owned state of one batch download. Mutated only by the sweep that
/// owns it; pollers read consistent snapshots.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub(crate) struct DownloadJob {
    pub(crate) id: JobId,
    pub(crate) total: usize,
    pub(crate) completed: usize,
    pub(crate) failed: usize,
    pub(crate) status: String,
    pub(crate) collection_info: CollectionInfo,
    pub(crate) tracks: Vec<TrackAttempt>,
    pub(crate) downloaded_files: Vec<DownloadedFile>,
}

impl DownloadJob {
    pub(crate) fn progress_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }

        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

#[async_trait]
pub(crate) trait JobStore: Send + Sync {
    async fn create_job(&self, total: usize, collection_info: CollectionInfo) -> JobId;
    async fn record_attempt(
        &self,
        job_id: &JobId,
        track: TrackDescriptor,
        outcome: TrackOutcome,
        file: Option<DownloadedFile>,
    ) -> Result<(), JobStoreError>;
    async fn set_status(&self, job_id: &JobId, status: &str) -> Result<(), JobStoreError>;
    async fn get_job(&self, job_id: &JobId) -> Option<DownloadJob>;
}

pub(crate) struct InMemoryJobStore {
    jobs: Mutex<HashMap<JobId, DownloadJob>>,
    last_issued_id: AtomicU64,
}

impl InMemoryJobStore {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            last_issued_id: AtomicU64::new(0),
        }
    }

    /// Millisecond timestamp bumped past the previously issued value, so ids
    /// stay unique and generation-ordered even within one millisecond.
    fn next_job_id(&self) -> JobId {
        let now = chrono::Utc::now().timestamp_millis() as u64;
        let issued = self
            .last_issued_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .map(|last| now.max(last + 1))
            .unwrap_or(now);

        JobId(issued.to_string())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self, total: usize, collection_info: CollectionInfo) -> JobId {
        let job_id = self.next_job_id();
        let job = DownloadJob {
            id: job_id.clone(),
            total,
            completed: 0,
            failed: 0,
            status: "downloading".to_string(),
            collection_info,
            tracks: vec![],
            downloaded_files: vec![],
        };

        let mut guard = self.jobs.lock().unwrap();
        guard.insert(job_id.clone(), job);

        job_id
    }

    async fn record_attempt(
        &self,
        job_id: &JobId,
        track: TrackDescriptor,
        outcome: TrackOutcome,
        file: Option<DownloadedFile>,
    ) -> Result<(), JobStoreError> {
        let mut guard = self.jobs.lock().unwrap();

        let job = guard.get_mut(job_id).ok_or(JobStoreError::JobNotFound)?;

        match outcome {
            TrackOutcome::Completed => job.completed += 1,
            TrackOutcome::Failed => job.failed += 1,
        }

        if let Some(file) = file {
            job.downloaded_files.push(file);
        }

        job.tracks.push(TrackAttempt {
            track,
            status: outcome,
        });

        Ok(())
    }

    async fn set_status(&self, job_id: &JobId, status: &str) -> Result<(), JobStoreError> {
        let mut guard = self.jobs.lock().unwrap();

        let job = guard.get_mut(job_id).ok_or(JobStoreError::JobNotFound)?;
        job.status = status.to_string();

        Ok(())
    }

    async fn get_job(&self, job_id: &JobId) -> Option<DownloadJob> {
        let guard = self.jobs.lock().unwrap();

        guard.get(job_id).cloned()
    }
}
