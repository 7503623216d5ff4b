use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::JobError;
use super::model::{ArtifactRef, JobStatus, MediaJob, PendingLink};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}

/// In-memory registry of jobs and parked chat links. Nothing here is
/// durable; the janitor reclaims entries once the retention window
/// passes.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, MediaJob>>>,
    links: Arc<RwLock<HashMap<String, PendingLink>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: MediaJob) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: &Uuid) -> Option<MediaJob> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn mark_running(&self, id: &Uuid) -> Result<(), StoreError> {
        self.transition(id, JobStatus::Running, |_| {}).await
    }

    pub async fn complete(&self, id: &Uuid, artifact: ArtifactRef) -> Result<(), StoreError> {
        self.transition(id, JobStatus::Succeeded, move |job| {
            job.artifact = Some(artifact);
        })
        .await
    }

    pub async fn fail(&self, id: &Uuid, err: &JobError) -> Result<(), StoreError> {
        let failure = err.into();
        self.transition(id, JobStatus::Failed, move |job| {
            job.error = Some(failure);
        })
        .await
    }

    async fn transition<F>(&self, id: &Uuid, next: JobStatus, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut MediaJob),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id).ok_or(StoreError::NotFound(*id))?;

        if !job.status.can_transition(next) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: job.status,
                to: next,
            });
        }

        job.status = next;
        job.updated_at = OffsetDateTime::now_utc();
        apply(job);
        Ok(())
    }

    pub async fn put_link(&self, key: String, url: String) {
        let link = PendingLink {
            url,
            created_at: OffsetDateTime::now_utc(),
        };
        self.links.write().await.insert(key, link);
    }

    /// Looked up, not consumed: the user may ask for both formats of the
    /// same link. Stale entries are swept by the janitor.
    pub async fn link(&self, key: &str) -> Option<PendingLink> {
        self.links.read().await.get(key).cloned()
    }

    /// Drops terminal jobs older than the retention window and links older
    /// than their ttl. Returns the removed jobs so the caller can delete
    /// their artifacts.
    pub async fn sweep(&self, job_retention_secs: u64, link_ttl_secs: u64) -> Vec<MediaJob> {
        let now = OffsetDateTime::now_utc();
        let job_cutoff = Duration::seconds(job_retention_secs as i64);
        let link_cutoff = Duration::seconds(link_ttl_secs as i64);

        let mut removed = Vec::new();
        {
            let mut jobs = self.jobs.write().await;
            let expired: Vec<Uuid> = jobs
                .values()
                .filter(|job| job.status.is_terminal() && now - job.updated_at > job_cutoff)
                .map(|job| job.id)
                .collect();
            for id in expired {
                if let Some(job) = jobs.remove(&id) {
                    removed.push(job);
                }
            }
        }

        self.links
            .write()
            .await
            .retain(|_, link| now - link.created_at <= link_cutoff);

        removed
    }

    #[cfg(test)]
    pub async fn links_len(&self) -> usize {
        self.links.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::jobs::model::{JobOrigin, Operation};

    fn job() -> MediaJob {
        MediaJob::new(
            "https://example.com/a.mp4".into(),
            Operation::ExtractAudio,
            JobOrigin::Api,
        )
    }

    fn artifact() -> ArtifactRef {
        ArtifactRef {
            file_name: "x.mp3".into(),
            content_type: "audio/mpeg".into(),
            size_bytes: 1,
        }
    }

    #[tokio::test]
    async fn lifecycle_reaches_exactly_one_terminal_state() {
        let store = JobStore::new();
        let j = job();
        let id = j.id;
        store.insert(j).await;

        store.mark_running(&id).await.unwrap();
        store.complete(&id, artifact()).await.unwrap();

        let done = store.get(&id).await.unwrap();
        assert_eq!(done.status, JobStatus::Succeeded);
        assert!(done.artifact.is_some());

        // terminal state never regresses
        let err = store
            .fail(&id, &JobError::Fetch("late".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(store.get(&id).await.unwrap().status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn failing_records_the_diagnostic() {
        let store = JobStore::new();
        let j = job();
        let id = j.id;
        store.insert(j).await;

        store.mark_running(&id).await.unwrap();
        store
            .fail(&id, &JobError::Transcode("bad stream".into()))
            .await
            .unwrap();

        let failed = store.get(&id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        let failure = failed.error.unwrap();
        assert_eq!(failure.kind, "transcode");
        assert!(failure.message.contains("bad stream"));
        assert!(!failure.retryable);
    }

    #[tokio::test]
    async fn unknown_job_is_reported() {
        let store = JobStore::new();
        let err = store.mark_running(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_terminal_jobs() {
        let store = JobStore::new();

        let mut old_done = job();
        old_done.status = JobStatus::Succeeded;
        old_done.updated_at = OffsetDateTime::now_utc() - Duration::seconds(120);
        let old_id = old_done.id;

        let mut old_running = job();
        old_running.status = JobStatus::Running;
        old_running.updated_at = OffsetDateTime::now_utc() - Duration::seconds(120);
        let running_id = old_running.id;

        let fresh_done = {
            let mut j = job();
            j.status = JobStatus::Failed;
            j
        };
        let fresh_id = fresh_done.id;

        store.insert(old_done).await;
        store.insert(old_running).await;
        store.insert(fresh_done).await;

        let removed = store.sweep(60, 60).await;
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, old_id);

        assert!(store.get(&old_id).await.is_none());
        assert!(store.get(&running_id).await.is_some());
        assert!(store.get(&fresh_id).await.is_some());
    }

    #[tokio::test]
    async fn links_survive_lookup_but_not_expiry() {
        let store = JobStore::new();
        store
            .put_link("abc123".into(), "https://example.com/v".into())
            .await;

        assert!(store.link("abc123").await.is_some());
        // repeated lookup still works (audio then video)
        assert!(store.link("abc123").await.is_some());
        assert!(store.link("nope").await.is_none());

        store.sweep(60, 900).await;
        assert_eq!(store.links_len().await, 1);

        store.sweep(60, 0).await;
        assert_eq!(store.links_len().await, 0);
    }
}
