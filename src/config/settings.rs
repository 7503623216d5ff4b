use std::path::PathBuf;

use crate::config::env::{self, EnvKey};

/// Telegram bot-api upload ceiling for files sent by bots.
const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 50 * 1024 * 1024;
const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub telegram_token: String,
    pub telegram_api_base: String,
    pub webhook_secret: String,
    pub public_url: Option<String>,
    pub ffmpeg_path: String,
    pub work_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub job_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_download_bytes: u64,
    pub max_artifact_bytes: u64,
    pub queue_capacity: usize,
    pub job_retention_secs: u64,
    pub link_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub delivery_retries: u32,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8080),
            telegram_token: env::get(EnvKey::TelegramToken)?,
            telegram_api_base: env::get_or(EnvKey::TelegramApiBase, "https://api.telegram.org"),
            webhook_secret: env::get(EnvKey::WebhookSecret)?,
            public_url: env::get_opt(EnvKey::PublicUrl),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            work_dir: PathBuf::from(env::get_or(EnvKey::WorkDir, "./data/work")),
            artifact_dir: PathBuf::from(env::get_or(EnvKey::ArtifactDir, "./data/artifacts")),
            job_timeout_secs: env::get_parsed(EnvKey::JobTimeoutSecs, 120),
            fetch_timeout_secs: env::get_parsed(EnvKey::FetchTimeoutSecs, 30),
            max_download_bytes: env::get_parsed(EnvKey::MaxDownloadBytes, DEFAULT_MAX_DOWNLOAD_BYTES),
            max_artifact_bytes: env::get_parsed(EnvKey::MaxArtifactBytes, DEFAULT_MAX_ARTIFACT_BYTES),
            queue_capacity: env::get_parsed(EnvKey::QueueCapacity, 64),
            job_retention_secs: env::get_parsed(EnvKey::JobRetentionSecs, 3600),
            link_ttl_secs: env::get_parsed(EnvKey::LinkTtlSecs, 900),
            sweep_interval_secs: env::get_parsed(EnvKey::SweepIntervalSecs, 300),
            delivery_retries: env::get_parsed(EnvKey::DeliveryRetries, 3),
        })
    }
}
