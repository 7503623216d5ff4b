use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::types::{ApiEnvelope, InlineKeyboardMarkup, SentMessage};

/// Bot-api client. Outbound delivery is retried a bounded number of times
/// with jittered backoff; an explicit rejection from the api (ok=false) is
/// final and not retried.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
    token: String,
    retries: u32,
}

impl TelegramClient {
    pub fn new(base: &str, token: &str, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // uploads of 50MB artifacts can be slow
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| anyhow!("failed to build telegram client: {}", e))?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retries,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base, self.token, method)
    }

    async fn invoke<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T> {
        let resp = self
            .http
            .post(self.endpoint(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {} transport error: {}", method, e))?;

        let envelope: ApiEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| anyhow!("telegram {} returned unreadable body: {}", method, e))?;

        if !envelope.ok {
            bail!(
                "telegram {} rejected: {}",
                method,
                envelope.description.unwrap_or_else(|| "unknown error".into())
            );
        }

        envelope
            .result
            .ok_or_else(|| anyhow!("telegram {} returned an empty result", method))
    }

    async fn invoke_with_retry<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match self.invoke(method, payload).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries && is_transient(&err) => {
                    warn!(
                        method,
                        attempt = attempt + 1,
                        "telegram call failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let sent: SentMessage = self
            .invoke_with_retry("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(sent.message_id)
    }

    pub async fn send_message_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        markup: &InlineKeyboardMarkup,
    ) -> Result<i64> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "reply_markup": markup,
        });
        let sent: SentMessage = self.invoke_with_retry("sendMessage", &payload).await?;
        Ok(sent.message_id)
    }

    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        let _: Value = self.invoke_with_retry("editMessageText", &payload).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let payload = json!({ "callback_query_id": callback_query_id });
        let _: Value = self.invoke("answerCallbackQuery", &payload).await?;
        Ok(())
    }

    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<()> {
        let payload = json!({
            "url": url,
            "secret_token": secret_token,
            "allowed_updates": ["message", "callback_query"],
        });
        let _: Value = self.invoke("setWebhook", &payload).await?;
        info!("Webhook registered at {}", url);
        Ok(())
    }

    /// Uploads a finished artifact into a chat. `method`/`field` come from
    /// the job's operation (sendAudio/audio, sendVideo/video). The file is
    /// streamed from disk and reopened on every retry attempt.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_media(
        &self,
        chat_id: i64,
        method: &str,
        field: &str,
        path: &Path,
        file_name: &str,
        content_type: &str,
        size_bytes: u64,
        caption: Option<&str>,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self
                .send_media_once(chat_id, method, field, path, file_name, content_type, size_bytes, caption)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.retries && is_transient(&err) => {
                    warn!(
                        method,
                        attempt = attempt + 1,
                        "telegram upload failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_media_once(
        &self,
        chat_id: i64,
        method: &str,
        field: &str,
        path: &Path,
        file_name: &str,
        content_type: &str,
        size_bytes: u64,
        caption: Option<&str>,
    ) -> Result<()> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| anyhow!("artifact {} unreadable: {}", path.display(), e))?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let part = reqwest::multipart::Part::stream_with_length(body, size_bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| anyhow!("invalid content type {}: {}", content_type, e))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field.to_string(), part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let resp = self
            .http
            .post(self.endpoint(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {} transport error: {}", method, e))?;

        let envelope: ApiEnvelope<Value> = resp
            .json()
            .await
            .map_err(|e| anyhow!("telegram {} returned unreadable body: {}", method, e))?;

        if !envelope.ok {
            bail!(
                "telegram {} rejected: {}",
                method,
                envelope.description.unwrap_or_else(|| "unknown error".into())
            );
        }

        Ok(())
    }
}

/// Rejections carry a bot-api description and retrying them is pointless;
/// everything else (transport, unreadable body) is worth another attempt.
fn is_transient(err: &anyhow::Error) -> bool {
    !err.to_string().contains("rejected")
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = 250u64 << attempt.min(4);
    let jitter = rand::rng().random_range(0..250u64);
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_the_token() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc", 3).unwrap();
        assert_eq!(
            client.endpoint("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn rejections_are_not_transient() {
        assert!(!is_transient(&anyhow!("telegram sendAudio rejected: too big")));
        assert!(is_transient(&anyhow!(
            "telegram sendAudio transport error: connection refused"
        )));
    }

    #[test]
    fn backoff_grows_but_stays_bounded() {
        let first = backoff_delay(0);
        let late = backoff_delay(10);
        assert!(first >= Duration::from_millis(250));
        assert!(late < Duration::from_secs(5));
    }
}
