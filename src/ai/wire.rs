//! Chat-completions wire format shared by the client and the relay.

use serde::{Deserialize, Serialize};

/// Message shown when an error body carries no message of its own.
pub const GENERIC_FAILURE: &str = "Failed to generate drafts";

/// One `{role, content}` entry of the `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body accepted by the relay: messages only, the relay picks the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

/// Body sent to the provider's `/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`, if present and not blank.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .filter(|c| !c.trim().is_empty())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"error": {"message": ...}}` (provider style), `{"error": "..."}`
/// (relay style) and a bare `{"message": ...}`.
pub fn error_message(body: &serde_json::Value) -> Option<String> {
    let message = match body.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.as_str()),
        Some(err) => err.get("message").and_then(|m| m.as_str()),
        None => body.get("message").and_then(|m| m.as_str()),
    };
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_content() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}}]
        }))
        .unwrap();
        assert_eq!(resp.first_content(), Some("hi"));
    }

    #[test]
    fn test_first_content_missing_or_blank() {
        let empty: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_content(), None);

        let blank: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "  "}}]})).unwrap();
        assert_eq!(blank.first_content(), None);

        let null: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert_eq!(null.first_content(), None);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&json!({"error": {"message": "Invalid key"}})),
            Some("Invalid key".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": "Messages are required"})),
            Some("Messages are required".to_string())
        );
        assert_eq!(
            error_message(&json!({"message": "bad"})),
            Some("bad".to_string())
        );
        assert_eq!(error_message(&json!({"error": {"code": 1}})), None);
        assert_eq!(error_message(&json!("oops")), None);
    }

    #[test]
    fn test_generate_request_missing_messages() {
        let req: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.messages.is_none());
    }
}
