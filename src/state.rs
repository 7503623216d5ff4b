use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::config::settings::AppConfig;
use crate::infrastructure::fetch::downloader::MediaFetcher;
use crate::infrastructure::queue::jobs::JobQueue;
use crate::infrastructure::telegram::client::TelegramClient;
use crate::modules::jobs::store::JobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub jobs: JobStore,
    pub queue: JobQueue,
    pub telegram: TelegramClient,
    pub fetcher: MediaFetcher,
    /// One ffmpeg at a time: the service runs as a single worker and
    /// concurrent encodes would starve each other.
    pub encoder_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let telegram = TelegramClient::new(
            &config.telegram_api_base,
            &config.telegram_token,
            config.delivery_retries,
        )?;
        let fetcher = MediaFetcher::new(config.fetch_timeout_secs, config.max_download_bytes)?;
        let queue = JobQueue::new(config.queue_capacity);

        Ok(Self {
            config,
            jobs: JobStore::new(),
            queue,
            telegram,
            fetcher,
            encoder_slots: Arc::new(Semaphore::new(1)),
        })
    }
}
