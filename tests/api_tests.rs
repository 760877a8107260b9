// tests/api_tests.rs

use chat_render::{config::Config, routes, state::AppState};
use serde_json::Value;
use url::Url;

fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        base_url: Some(Url::parse("https://footprint.example/dashboard").unwrap()),
        max_content_length: 200,
        cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let state = AppState::new(test_config());
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn sanitize(client: &reqwest::Client, address: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/api/render/sanitize", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_check_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn sanitize_demotes_script() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = sanitize(
        &client,
        &address,
        serde_json::json!({ "html": "<script>alert(1)</script><em>ok</em>" }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["html"], "alert(1)<em>ok</em>");
}

#[tokio::test]
async fn sanitize_resolves_relative_links_against_base() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = sanitize(
        &client,
        &address,
        serde_json::json!({
            "html": "<a href=\"/reports/42\">report</a> <a href=\"javascript:void(0)\">bad</a>"
        }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["html"],
        "<a href=\"https://footprint.example/reports/42\" target=\"_blank\" rel=\"noopener noreferrer\">report</a> <a>bad</a>"
    );
}

#[tokio::test]
async fn sanitize_null_and_missing_yield_empty() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({ "html": null }),
        serde_json::json!({}),
        serde_json::json!({ "html": "" }),
    ] {
        let response = sanitize(&client, &address, body).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["html"], "");
    }
}

#[tokio::test]
async fn sanitize_rejects_oversized_content() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = sanitize(
        &client,
        &address,
        serde_json::json!({ "html": "x".repeat(201) }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 413);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("200"));
}

#[tokio::test]
async fn render_messages_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/api/render/messages", address))
        .json(&serde_json::json!({
            "messages": [
                { "sender": "user", "content": "<b>is this bold?</b>" },
                { "sender": "assistant", "content": "<p>Found <strong>2</strong> posts <img src=x onerror=alert(1)></p>" },
                { "sender": "assistant", "content": "No markup here" },
                { "sender": "assistant", "content": null }
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Vec<Value> = response.json().await.unwrap();
    assert_eq!(body.len(), 4);

    assert_eq!(body[0]["sender"], "user");
    assert_eq!(body[0]["class"], "chat-bubble chat-user");
    assert_eq!(body[0]["markup"], false);
    assert!(!body[0]["html"].as_str().unwrap().contains('<'));

    assert_eq!(body[1]["class"], "chat-bubble chat-assistant");
    assert_eq!(body[1]["markup"], true);
    assert_eq!(body[1]["html"], "<p>Found <strong>2</strong> posts </p>");
    assert_eq!(body[1]["preview"], "Found 2 posts ");

    assert_eq!(body[2]["markup"], false);
    assert_eq!(body[2]["preview"], "No markup here");

    assert_eq!(body[3]["html"], "");
}

#[tokio::test]
async fn render_messages_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: empty sender
    let response = client
        .post(format!("{}/api/render/messages", address))
        .json(&serde_json::json!({
            "messages": [{ "sender": "", "content": "hi" }]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn render_messages_rejects_oversized_message() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/render/messages", address))
        .json(&serde_json::json!({
            "messages": [
                { "sender": "user", "content": "fine" },
                { "sender": "assistant", "content": "y".repeat(500) }
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 413);
}

#[tokio::test]
async fn policy_lists_allow_list() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/render/policy", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();

    let tags: Vec<&str> = body["allowed_tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    for tag in ["a", "b", "br", "code", "em", "i", "li", "ol", "p", "strong", "ul"] {
        assert!(tags.contains(&tag), "missing {}", tag);
    }
    assert_eq!(tags.len(), 11);
    assert_eq!(body["allowed_schemes"], serde_json::json!(["http", "https"]));
    assert_eq!(body["base_url"], "https://footprint.example/dashboard");
}
