use std::sync::OnceLock;

use anyhow::{Result, anyhow, bail};
use regex::Regex;
use tracing::{error, info};
use uuid::Uuid;

use super::dto::{CallbackQuery, Message, Update};
use crate::infrastructure::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::modules::jobs::model::{JobOrigin, Operation};
use crate::modules::jobs::service::JobService;
use crate::state::AppState;

const WELCOME_TEXT: &str =
    "Hi! Send me a direct media link and I'll convert it to audio or video for you.";
const NO_LINK_TEXT: &str = "Please send a direct http(s) link to a media file.";
const CHOOSE_FORMAT_TEXT: &str = "What format would you like?";
const EXPIRED_LINK_TEXT: &str = "I've forgotten that link. Please send it again.";
const BAD_SELECTION_TEXT: &str = "Error: Invalid selection. Please send the link again.";
const PROCESSING_TEXT: &str = "Processing... this may take a moment.";
const BUSY_TEXT: &str = "I'm busy with other conversions right now. Please try again in a bit.";

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap())
}

pub struct WebhookService;

impl WebhookService {
    /// Entry point for one update. Runs on a spawned task: the webhook
    /// handler has already acknowledged the platform, so failures end
    /// here, in the log.
    pub async fn handle_update(state: AppState, update: Update) {
        let update_id = update.update_id;
        let outcome = if let Some(message) = update.message {
            Self::handle_message(&state, message).await
        } else if let Some(callback) = update.callback_query {
            Self::handle_callback(&state, callback).await
        } else {
            Ok(())
        };

        if let Err(e) = outcome {
            error!(update_id, "failed to process update: {}", e);
        }
    }

    async fn handle_message(state: &AppState, message: Message) -> Result<()> {
        let chat_id = message.chat.id;
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };

        if text.trim().starts_with("/start") {
            state.telegram.send_message(chat_id, WELCOME_TEXT).await?;
            return Ok(());
        }

        match Self::extract_url(text) {
            Some(url) => {
                let key = Uuid::new_v4().as_simple().to_string()[..8].to_string();
                state.jobs.put_link(key.clone(), url).await;

                let markup = InlineKeyboardMarkup::single_row(vec![
                    InlineKeyboardButton::callback("Audio (MP3)", format!("a:{}", key)),
                    InlineKeyboardButton::callback("Video (MP4)", format!("v:{}", key)),
                ]);
                state
                    .telegram
                    .send_message_with_keyboard(chat_id, CHOOSE_FORMAT_TEXT, &markup)
                    .await?;
                info!(chat_id, key = %key, "parked link, offered formats");
            }
            None => {
                state.telegram.send_message(chat_id, NO_LINK_TEXT).await?;
            }
        }

        Ok(())
    }

    async fn handle_callback(state: &AppState, callback: CallbackQuery) -> Result<()> {
        // ack first so the client stops its spinner
        if let Err(e) = state.telegram.answer_callback_query(&callback.id).await {
            tracing::warn!("failed to answer callback query: {}", e);
        }

        let message = callback
            .message
            .ok_or_else(|| anyhow!("callback without an attached message"))?;
        let chat_id = message.chat.id;
        let message_id = message.message_id;

        let data = callback.data.as_deref().unwrap_or_default();
        let Some((operation, key)) = Self::parse_callback(data) else {
            state
                .telegram
                .edit_message_text(chat_id, message_id, BAD_SELECTION_TEXT)
                .await?;
            bail!("unrecognized callback data {:?}", data);
        };

        let Some(link) = state.jobs.link(key).await else {
            state
                .telegram
                .edit_message_text(chat_id, message_id, EXPIRED_LINK_TEXT)
                .await?;
            return Ok(());
        };

        let origin = JobOrigin::Chat {
            chat_id,
            status_message_id: Some(message_id),
        };
        let job = match JobService::submit(state, &link.url, operation, origin).await {
            Ok(job) => job,
            Err(e) => {
                state
                    .telegram
                    .edit_message_text(chat_id, message_id, &format!("Error: {}", e))
                    .await?;
                return Ok(());
            }
        };

        if let Err(e) = state.queue.publish(job.id) {
            let busy = crate::modules::jobs::error::JobError::Delivery(e.to_string());
            let _ = state.jobs.fail(&job.id, &busy).await;
            state
                .telegram
                .edit_message_text(chat_id, message_id, BUSY_TEXT)
                .await?;
            return Ok(());
        }

        state
            .telegram
            .edit_message_text(chat_id, message_id, PROCESSING_TEXT)
            .await?;
        info!(chat_id, job_id = %job.id, operation = operation.as_str(), "job queued from chat");
        Ok(())
    }

    /// First http(s) URL in the text, with trailing punctuation stripped.
    pub fn extract_url(text: &str) -> Option<String> {
        let candidate = url_pattern().find(text)?.as_str();
        let trimmed = candidate.trim_end_matches([')', ']', ',', '.', '!', '?']);
        let parsed = url::Url::parse(trimmed).ok()?;
        match parsed.scheme() {
            "http" | "https" => Some(parsed.to_string()),
            _ => None,
        }
    }

    /// Callback payloads look like `a:<key>` / `v:<key>`.
    pub fn parse_callback(data: &str) -> Option<(Operation, &str)> {
        let (tag, key) = data.split_once(':')?;
        if key.is_empty() {
            return None;
        }
        match tag {
            "a" => Some((Operation::ExtractAudio, key)),
            "v" => Some((Operation::Transcode, key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_http_url() {
        let text = "check this out https://example.com/clip.mp4 and tell me";
        assert_eq!(
            WebhookService::extract_url(text).as_deref(),
            Some("https://example.com/clip.mp4")
        );
    }

    #[test]
    fn strips_trailing_punctuation() {
        assert_eq!(
            WebhookService::extract_url("see (https://example.com/a.mp3).").as_deref(),
            Some("https://example.com/a.mp3")
        );
    }

    #[test]
    fn rejects_text_without_a_link() {
        assert!(WebhookService::extract_url("hello there").is_none());
        assert!(WebhookService::extract_url("ftp://example.com/a").is_none());
    }

    #[test]
    fn parses_callback_payloads() {
        assert_eq!(
            WebhookService::parse_callback("a:deadbeef"),
            Some((Operation::ExtractAudio, "deadbeef"))
        );
        assert_eq!(
            WebhookService::parse_callback("v:cafe0123"),
            Some((Operation::Transcode, "cafe0123"))
        );
        assert_eq!(WebhookService::parse_callback("x:abc"), None);
        assert_eq!(WebhookService::parse_callback("a:"), None);
        assert_eq!(WebhookService::parse_callback("garbage"), None);
    }
}
