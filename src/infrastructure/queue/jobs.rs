use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender, TrySendError};
use tracing::info;
use uuid::Uuid;

/// Bounded in-process queue feeding the transcoder worker. Publishing
/// never blocks a request handler: a full queue is an error the gateway
/// reports instead of waiting out.
#[derive(Clone)]
pub struct JobQueue {
    tx: Sender<Uuid>,
    rx: Receiver<Uuid>,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity);
        info!("Job queue ready (capacity {})", capacity);
        Self { tx, rx }
    }

    pub fn publish(&self, job_id: Uuid) -> Result<()> {
        self.tx.try_send(job_id).map_err(|e| match e {
            TrySendError::Full(_) => anyhow!("job queue is full"),
            TrySendError::Closed(_) => anyhow!("job queue is closed"),
        })
    }

    pub async fn recv(&self) -> Option<Uuid> {
        self.rx.recv().await.ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
