use serde::{Deserialize, Serialize};
use validator::Validate;

/// A chat message as stored by the messaging backend.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ChatMessage {
    /// 'user' or 'assistant'. Anything else renders like an assistant bubble
    /// but is never treated as markup.
    #[validate(length(min = 1, max = 32, message = "Sender must be between 1 and 32 chars"))]
    pub sender: String,

    /// Missing or null content renders as an empty bubble.
    #[serde(default)]
    pub content: Option<String>,
}

/// A message ready to be inserted into the chat panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub sender: String,
    /// CSS class list of the message bubble.
    pub class: String,
    /// Safe to assign as inner HTML.
    pub html: String,
    /// Whether `html` came from the sanitizer rather than text escaping.
    pub markup: bool,
    /// Short plain-text excerpt. Must be inserted as text, not HTML.
    pub preview: String,
}

/// DTO for sanitizing a single fragment.
#[derive(Debug, Deserialize)]
pub struct SanitizeRequest {
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SanitizeResponse {
    pub html: String,
}

/// DTO for rendering a batch of session messages.
#[derive(Debug, Deserialize, Validate)]
pub struct RenderMessagesRequest {
    #[validate(
        length(max = 500, message = "At most 500 messages can be rendered at once"),
        nested
    )]
    pub messages: Vec<ChatMessage>,
}

/// Describes the active sanitizer policy.
#[derive(Debug, Serialize, Deserialize)]
pub struct PolicyResponse {
    pub allowed_tags: Vec<String>,
    pub allowed_schemes: Vec<String>,
    pub base_url: Option<String>,
}
