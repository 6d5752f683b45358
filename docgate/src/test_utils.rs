//! Test utilities shared by handler tests.

use std::path::Path;
use std::time::Duration;

use axum_test::TestServer;
use wiremock::MockServer;

use crate::config::{ActivityLogConfig, Config, OcrConfig, OpenAiConfig, UploadsConfig};

pub const TEST_API_KEY: &str = "test-api-key";

/// Config rooted in `dir`, with upstream credentials unset and upstream URLs pointing at a
/// port nothing listens on.
pub fn create_test_config(dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_key: Some(TEST_API_KEY.to_string()),
        public_url: Some("http://files.test".parse().unwrap()),
        uploads: UploadsConfig {
            dir: dir.join("uploads"),
            max_upload_mb: 1,
        },
        openai: OpenAiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/v1".parse().unwrap(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        },
        ocr: OcrConfig {
            api_key: None,
            url: "http://127.0.0.1:9/parse/image".parse().unwrap(),
            timeout: Duration::from_secs(2),
        },
        activity_log: ActivityLogConfig {
            path: dir.join("activity_log.json"),
            max_entries: 100,
        },
        ..Default::default()
    }
}

/// Point the completion upstream at `server` with a configured key.
pub fn with_openai(mut config: Config, server: &MockServer) -> Config {
    config.openai.api_key = Some("sk-test".to_string());
    config.openai.base_url = format!("{}/v1", server.uri()).parse().unwrap();
    config
}

/// Point the OCR upstream at `server` with a configured key.
pub fn with_ocr(mut config: Config, server: &MockServer) -> Config {
    config.ocr.api_key = Some("ocr-test".to_string());
    config.ocr.url = format!("{}/parse/image", server.uri()).parse().unwrap();
    config
}

pub async fn create_test_server(config: Config) -> TestServer {
    crate::Application::new(config)
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// A minimal OpenAI-style completion body answering with `content`.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}
