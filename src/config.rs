// src/config.rs

use std::env;
use dotenvy::dotenv;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub rust_log: String,
    /// Page location that relative chat links resolve against.
    pub base_url: Option<Url>,
    /// Maximum characters accepted in a single fragment or message.
    pub max_content_length: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("SANITIZER_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Url::parse(v.trim()).expect("SANITIZER_BASE_URL must be an absolute URL"));

        let max_content_length = env::var("MAX_CONTENT_LENGTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20_000);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            bind_addr,
            rust_log,
            base_url,
            max_content_length,
            cors_origins,
        }
    }
}
