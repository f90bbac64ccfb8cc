//! Inbound request types, model name mapping, and message flattening.
//!
//! The upstream accepts a single user turn, so the whole conversation is
//! collapsed into one `"<role>:<text>;\r\n"`-per-message blob before
//! submission.

use serde::Deserialize;

/// Fallback upstream model for unrecognized client identifiers.
pub const DEFAULT_UPSTREAM_MODEL: &str = "gpt-4o-mini";

/// OpenAI-style chat completion request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Enable streaming response.
    #[serde(default)]
    pub stream: bool,
}

/// One conversation turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
}

/// Message content is either a plain string or an array of parts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

/// One entry of an array-of-parts content. Only the text field matters here;
/// parts without text are dropped during flattening.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Map a client-facing model id to the upstream's internal identifier.
///
/// Case-insensitive, total: anything unrecognized (including an empty
/// string) falls back to [`DEFAULT_UPSTREAM_MODEL`].
pub fn map_model(client_model: &str) -> &'static str {
    match client_model.to_ascii_lowercase().as_str() {
        "claude-3-haiku" => "claude-3-haiku-20240307",
        "llama-3.1-70b" => "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
        "mixtral-8x7b" => "mistralai/Mixtral-8x7B-Instruct-v0.1",
        _ => DEFAULT_UPSTREAM_MODEL,
    }
}

/// Collapse the conversation into the flat text blob the upstream expects.
///
/// `system` is remapped to `user`; roles outside {user, assistant, system}
/// are dropped. Never fails.
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    let mut flattened = String::new();
    for message in messages {
        let role = match message.role.as_str() {
            "system" | "user" => "user",
            "assistant" => "assistant",
            _ => continue,
        };
        let text: String = match &message.content {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .filter(|t| !t.is_empty())
                .collect(),
        };
        flattened.push_str(role);
        flattened.push(':');
        flattened.push_str(&text);
        flattened.push_str(";\r\n");
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage { role: role.to_string(), content: MessageContent::Text(content.to_string()) }
    }

    #[test]
    fn test_flatten_single_user_message() {
        assert_eq!(flatten_messages(&[msg("user", "hi")]), "user:hi;\r\n");
    }

    #[test]
    fn test_flatten_remaps_system_to_user() {
        let out = flatten_messages(&[msg("system", "be brief"), msg("user", "hi")]);
        assert_eq!(out, "user:be brief;\r\nuser:hi;\r\n");
        assert!(!out.contains("system:"));
    }

    #[test]
    fn test_flatten_drops_unknown_roles() {
        let out = flatten_messages(&[msg("tool", "{}"), msg("assistant", "ok")]);
        assert_eq!(out, "assistant:ok;\r\n");
    }

    #[test]
    fn test_flatten_only_user_or_assistant_tags() {
        let out = flatten_messages(&[
            msg("system", "a"),
            msg("user", "b"),
            msg("assistant", "c"),
            msg("function", "d"),
        ]);
        for line in out.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.starts_with("user:") || line.starts_with("assistant:"), "{}", line);
        }
    }

    #[test]
    fn test_flatten_empty_input() {
        assert_eq!(flatten_messages(&[]), "");
    }

    #[test]
    fn test_flatten_parts_content_filters_missing_text() {
        let message = ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart { text: Some("Hello".to_string()) },
                ContentPart { text: None },
                ContentPart { text: Some(String::new()) },
                ContentPart { text: Some(" world".to_string()) },
            ]),
        };
        assert_eq!(flatten_messages(&[message]), "user:Hello world;\r\n");
    }

    #[test]
    fn test_parts_content_deserializes() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"model":"claude-3-haiku","messages":[
                {"role":"user","content":[{"type":"text","text":"hi"},{"type":"image_url"}]}
            ],"stream":true}"#,
        )
        .unwrap();
        assert!(request.stream);
        assert_eq!(flatten_messages(&request.messages), "user:hi;\r\n");
    }

    #[test]
    fn test_map_model_fixed_entries() {
        assert_eq!(map_model("claude-3-haiku"), "claude-3-haiku-20240307");
        assert_eq!(map_model("Claude-3-Haiku"), "claude-3-haiku-20240307");
        assert_eq!(map_model("CLAUDE-3-HAIKU"), "claude-3-haiku-20240307");
        assert_eq!(map_model("llama-3.1-70b"), "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo");
        assert_eq!(map_model("mixtral-8x7b"), "mistralai/Mixtral-8x7B-Instruct-v0.1");
    }

    #[test]
    fn test_map_model_default_fallback() {
        assert_eq!(map_model(""), DEFAULT_UPSTREAM_MODEL);
        assert_eq!(map_model("gpt-4o-mini"), DEFAULT_UPSTREAM_MODEL);
        assert_eq!(map_model("does-not-exist"), DEFAULT_UPSTREAM_MODEL);
    }
}
