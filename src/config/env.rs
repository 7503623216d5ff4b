use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    TelegramToken,
    TelegramApiBase,
    WebhookSecret,
    PublicUrl,
    FfmpegPath,
    WorkDir,
    ArtifactDir,
    JobTimeoutSecs,
    FetchTimeoutSecs,
    MaxDownloadBytes,
    MaxArtifactBytes,
    QueueCapacity,
    JobRetentionSecs,
    LinkTtlSecs,
    SweepIntervalSecs,
    DeliveryRetries,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::TelegramToken => "TELEGRAM_TOKEN",
            EnvKey::TelegramApiBase => "TELEGRAM_API_BASE",
            EnvKey::WebhookSecret => "WEBHOOK_SECRET",
            EnvKey::PublicUrl => "PUBLIC_URL",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::WorkDir => "WORK_DIR",
            EnvKey::ArtifactDir => "ARTIFACT_DIR",
            EnvKey::JobTimeoutSecs => "JOB_TIMEOUT_SECS",
            EnvKey::FetchTimeoutSecs => "FETCH_TIMEOUT_SECS",
            EnvKey::MaxDownloadBytes => "MAX_DOWNLOAD_BYTES",
            EnvKey::MaxArtifactBytes => "MAX_ARTIFACT_BYTES",
            EnvKey::QueueCapacity => "QUEUE_CAPACITY",
            EnvKey::JobRetentionSecs => "JOB_RETENTION_SECS",
            EnvKey::LinkTtlSecs => "LINK_TTL_SECS",
            EnvKey::SweepIntervalSecs => "SWEEP_INTERVAL_SECS",
            EnvKey::DeliveryRetries => "DELIVERY_RETRIES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
