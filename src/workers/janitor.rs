use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::modules::jobs::service::JobService;
use crate::state::AppState;

/// Reclaims finished jobs, their artifacts and stale chat links once the
/// retention window passes.
pub async fn start_janitor(state: AppState) {
    let interval = Duration::from_secs(state.config.sweep_interval_secs.max(1));
    info!("Starting janitor (sweep every {:?})", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately; skip it so startup stays quiet
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let removed = state
            .jobs
            .sweep(state.config.job_retention_secs, state.config.link_ttl_secs)
            .await;

        for job in &removed {
            let Some(artifact) = &job.artifact else {
                continue;
            };
            let path = JobService::artifact_path(&state.config, &artifact.file_name);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(job_id = %job.id, "failed to remove artifact {}: {}", path.display(), e);
                }
            }
        }

        if !removed.is_empty() {
            info!(count = removed.len(), "reclaimed expired jobs");
        }
    }
}
