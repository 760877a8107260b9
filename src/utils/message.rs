// src/utils/message.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    models::message::{ChatMessage, RenderedMessage},
    utils::html::Sanitizer,
};

pub const ASSISTANT: &str = "assistant";
pub const USER: &str = "user";

/// Default length of message previews, in characters.
pub const PREVIEW_LEN: usize = 100;

static MARKUP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<[a-z][\s\S]*>").expect("markup pattern is valid"));

/// Cheap check for content that carries at least one tag-like construct.
pub fn looks_like_markup(content: &str) -> bool {
    MARKUP_PATTERN.is_match(content)
}

pub fn bubble_class(sender: &str) -> &'static str {
    if sender == USER {
        "chat-bubble chat-user"
    } else {
        "chat-bubble chat-assistant"
    }
}

/// Cuts `text` to `max_len` characters, appending an ellipsis when shortened.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

/// Renders one chat message.
///
/// Only assistant replies that look like markup go through the sanitizer.
/// Everything else, user input included, is escaped and shown as text.
pub fn render_message(sanitizer: &Sanitizer, message: &ChatMessage) -> RenderedMessage {
    let content = message.content.as_deref().unwrap_or_default();
    let markup = message.sender == ASSISTANT && looks_like_markup(content);

    let (html, text) = if markup {
        (sanitizer.sanitize(content), sanitizer.visible_text(content))
    } else {
        (ammonia::clean_text(content), content.to_string())
    };

    RenderedMessage {
        sender: message.sender.clone(),
        class: bubble_class(&message.sender).to_string(),
        html,
        markup,
        preview: truncate_text(&text, PREVIEW_LEN),
    }
}
