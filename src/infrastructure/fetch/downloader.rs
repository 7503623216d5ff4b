use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Streams remote media to disk with a hard size cap. The caller decides
/// where the file lands (a per-job scoped directory) and maps any failure
/// here into the fetch branch of the job error taxonomy.
#[derive(Clone)]
pub struct MediaFetcher {
    http: reqwest::Client,
    max_bytes: u64,
}

impl MediaFetcher {
    pub fn new(timeout_secs: u64, max_bytes: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow!("failed to build fetch client: {}", e))?;

        Ok(Self { http, max_bytes })
    }

    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {}", e))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("source responded with status {}", status);
        }

        if let Some(len) = resp.content_length() {
            if len > self.max_bytes {
                bail!(
                    "source is {} bytes, over the {} byte download limit",
                    len,
                    self.max_bytes
                );
            }
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| anyhow!("failed to create {}: {}", dest.display(), e))?;

        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| anyhow!("read from source failed: {}", e))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                bail!(
                    "source exceeded the {} byte download limit",
                    self.max_bytes
                );
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| anyhow!("write to {} failed: {}", dest.display(), e))?;
        }

        file.flush()
            .await
            .map_err(|e| anyhow!("flush of {} failed: {}", dest.display(), e))?;

        if written == 0 {
            bail!("source body was empty");
        }

        debug!(url, bytes = written, "fetched source media");
        Ok(written)
    }
}
