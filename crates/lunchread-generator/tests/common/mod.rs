//! Shared test infrastructure for lunchread-generator tests
//!
//! Mock servers here run on the real clock, so policies use millisecond delays
//! and no jitter instead of a paused runtime.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lunchread_core::retry::NoJitter;
use lunchread_core::types::{ApiConfig, RetryPolicy};
use lunchread_generator::MessagesClient;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-key";

pub const ENGLISH_ARTICLE: &str = "# Ship It Safely\n\nFeature flags decouple deploys from releases. They also add risk.\n\n## Flags\n\nKeep them short-lived.\n\ntags: [\"DevOps\", \"Release\"]\nexcerpt: \"Why feature flags make shipping boring.\"";

pub const FRENCH_ARTICLE: &str = "# Livrer sereinement\n\nLes feature flags découplent déploiement et livraison.\n\ntags: [\"DevOps\"]\nrésumé: \"Pourquoi les feature flags rendent la livraison banale.\"";

/// A policy with the default classification rules and near-zero waits
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay_ms: 1,
        overloaded_min_delay_ms: 1,
        per_status_overrides: Default::default(),
        jitter_max_ms: 0,
        ..RetryPolicy::default()
    }
}

/// A client pointed at the mock server
pub fn client_for(server: &MockServer, policy: RetryPolicy) -> MessagesClient {
    let config = ApiConfig {
        base_url: format!("{}/v1", server.uri()),
        timeout_secs: 5,
        ..ApiConfig::default()
    };
    MessagesClient::new(config, TEST_API_KEY, policy)
        .unwrap()
        .with_jitter(Arc::new(NoJitter))
}

/// A successful Messages API body with one text block
pub fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-opus-20240229",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 10, "output_tokens": 20 }
    }))
}

/// Always answer with `text`
pub async fn mock_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", TEST_API_KEY))
        .respond_with(text_response(text))
        .mount(server)
        .await;
}

/// Fail with `status` for the first `times` requests
pub async fn mock_failures(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream trouble"))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Answer requests whose prompt asks for `language`
pub async fn mock_language(server: &MockServer, language: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains(format!("Write the article in {}", language)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Requests received so far
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

/// Upper bound for any test's wall-clock time
pub const TEST_DEADLINE: Duration = Duration::from_secs(10);
