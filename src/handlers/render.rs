use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::message::{
        PolicyResponse, RenderMessagesRequest, RenderedMessage, SanitizeRequest,
        SanitizeResponse,
    },
    utils::{html::Sanitizer, message::render_message},
};

/// Rejects content longer than the configured limit (in characters).
fn check_length(content: &str, config: &Config) -> Result<(), AppError> {
    if content.chars().count() > config.max_content_length {
        return Err(AppError::PayloadTooLarge(format!(
            "Content exceeds {} characters",
            config.max_content_length
        )));
    }
    Ok(())
}

/// Sanitizes a single untrusted fragment.
/// A missing or null `html` yields an empty fragment.
pub async fn sanitize(
    State(sanitizer): State<Arc<Sanitizer>>,
    State(config): State<Config>,
    Json(payload): Json<SanitizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let raw = payload.html.as_deref();
    if let Some(raw) = raw {
        check_length(raw, &config)?;
    }

    let html = sanitizer.sanitize(raw);

    Ok(Json(SanitizeResponse { html }))
}

/// Renders a batch of chat messages into bubble markup.
/// Output order matches input order.
pub async fn render_messages(
    State(sanitizer): State<Arc<Sanitizer>>,
    State(config): State<Config>,
    Json(payload): Json<RenderMessagesRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validate payload
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // 2. Enforce content size
    for content in payload.messages.iter().filter_map(|m| m.content.as_deref()) {
        check_length(content, &config)?;
    }

    // 3. Render
    let rendered: Vec<RenderedMessage> = payload
        .messages
        .iter()
        .map(|message| render_message(&sanitizer, message))
        .collect();

    let markup_count = rendered.iter().filter(|m| m.markup).count();
    tracing::debug!(
        "Rendered {} message(s), {} as sanitized markup",
        rendered.len(),
        markup_count
    );

    Ok(Json(rendered))
}

/// Describes the allow-list currently in force.
pub async fn get_policy(State(sanitizer): State<Arc<Sanitizer>>) -> impl IntoResponse {
    let policy = sanitizer.policy();

    Json(PolicyResponse {
        allowed_tags: policy.allowed_tags().map(str::to_string).collect(),
        allowed_schemes: policy.allowed_schemes().map(str::to_string).collect(),
        base_url: policy.base_url().map(|url| url.to_string()),
    })
}
