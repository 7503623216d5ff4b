use serde::Deserialize;

/// Subset of a bot-api update the service acts on. Unknown fields are
/// ignored so new platform fields never break parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_text_message_update() {
        let raw = r#"{
            "update_id": 7,
            "message": {
                "message_id": 41,
                "date": 1700000000,
                "chat": {"id": 99, "type": "private"},
                "from": {"id": 12, "is_bot": false, "first_name": "A"},
                "text": "https://example.com/clip.mp4"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.chat.id, 99);
        assert_eq!(msg.from.unwrap().id, 12);
        assert_eq!(msg.text.as_deref(), Some("https://example.com/clip.mp4"));
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn parses_a_callback_query_update() {
        let raw = r#"{
            "update_id": 8,
            "callback_query": {
                "id": "cb42",
                "from": {"id": 12, "is_bot": false, "first_name": "A"},
                "message": {
                    "message_id": 50,
                    "date": 1700000001,
                    "chat": {"id": 99, "type": "private"}
                },
                "data": "a:deadbeef"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        let cb = update.callback_query.unwrap();
        assert_eq!(cb.id, "cb42");
        assert_eq!(cb.data.as_deref(), Some("a:deadbeef"));
        assert_eq!(cb.message.unwrap().message_id, 50);
    }

    #[test]
    fn tolerates_updates_with_neither_field() {
        let update: Update = serde_json::from_str(r#"{"update_id": 9}"#).unwrap();
        assert!(update.message.is_none());
        assert!(update.callback_query.is_none());
    }
}
