//! Messages API client
//!
//! Every call becomes one attempt for the retry executor: non-2xx responses
//! turn into HTTP failures carrying their headers, transport errors into
//! network failures, and a 2xx body without text into a malformed-response
//! failure.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use lunchread_core::retry::{
    Failure, JitterSource, RandomJitter, ResponseHints, RetryError, RetryExecutorBuilder,
    TracingObserver,
};
use lunchread_core::types::{ApiConfig, NetworkErrorCode, RetryPolicy};
use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::wire::{MessagesRequest, MessagesResponse};

/// Token budget for the connection check
const PING_MAX_TOKENS: u32 = 100;

/// Longest response body excerpt kept in failure messages
const BODY_SNIPPET_LEN: usize = 200;

/// Client for the Messages API
pub struct MessagesClient {
    http: reqwest::Client,
    config: ApiConfig,
    api_key: String,
    policy: RetryPolicy,
    jitter: Arc<dyn JitterSource>,
}

impl MessagesClient {
    /// Create a new client
    pub fn new(config: ApiConfig, api_key: impl Into<String>, policy: RetryPolicy) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            api_key,
            policy,
            jitter: Arc::new(RandomJitter::new()),
        })
    }

    /// Replace the jitter source used between retries
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    /// The retry policy for completions
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The API configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Generate text for a prompt, retrying per the client's policy
    ///
    /// `operation` names the call in logs (e.g. `generate-en`).
    pub async fn complete(
        &self,
        prompt: &str,
        operation: &str,
    ) -> std::result::Result<String, RetryError> {
        let request = MessagesRequest::user(&self.config.model, self.config.max_tokens, prompt);

        let executor = RetryExecutorBuilder::new()
            .with_policy(self.policy.clone())
            .with_observer(TracingObserver::new(operation))
            .with_jitter(self.jitter.clone())
            .build();

        let request = &request;
        let response = executor.execute(move || self.send_once(request)).await?;

        // send_once only returns responses that have text
        Ok(response.first_text().unwrap_or_default().to_string())
    }

    /// Validate the API key and connectivity with a short request
    ///
    /// Makes exactly one attempt.
    pub async fn ping(&self) -> Result<()> {
        let request = MessagesRequest::user(&self.config.model, PING_MAX_TOKENS, "Hello");

        let executor = RetryExecutorBuilder::new()
            .with_policy(self.policy.clone().with_max_attempts(1))
            .with_observer(TracingObserver::new("ping"))
            .without_jitter()
            .build();

        let request = &request;
        executor
            .execute(move || self.send_once(request))
            .await
            .map_err(Error::ApiConnection)?;

        info!("Successfully connected to the Messages API");
        Ok(())
    }

    /// One HTTP round trip, mapped onto the executor's failure model
    pub async fn send_once(
        &self,
        request: &MessagesRequest,
    ) -> std::result::Result<MessagesResponse, Failure> {
        let request_id = request_id();
        let started = Instant::now();
        info!(request_id = %request_id, url = %self.endpoint(), "API request started");
        debug!(
            request_id = %request_id,
            model = %request.model,
            max_tokens = request.max_tokens,
            "API request details"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let code = network_code(&e);
                warn!(request_id = %request_id, code = %code, "API request failed: {}", e);
                Failure::network(code, format!("request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            request_id = %request_id,
            status = status.as_u16(),
            duration_ms = duration_ms,
            "API request completed"
        );

        if !status.is_success() {
            let headers = response.headers().iter().filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            });
            let hints = ResponseHints::from_headers(headers);
            let body = response.text().await.unwrap_or_default();
            return Err(Failure::http(
                status.as_u16(),
                hints,
                format!("API returned status {}: {}", status.as_u16(), snippet(&body)),
            ));
        }

        let body = response.text().await.map_err(|e| {
            Failure::network(network_code(&e), format!("failed to read response body: {}", e))
                .with_source(e)
        })?;

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            Failure::malformed(format!("invalid API response body: {}", e)).with_source(e)
        })?;

        if parsed.first_text().is_none() {
            warn!(request_id = %request_id, "API response has no text content");
            return Err(Failure::malformed("Invalid API response format"));
        }

        Ok(parsed)
    }
}

/// Short hex id correlating log lines of one request
fn request_id() -> String {
    let bytes: [u8; 4] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Derive a network error code from a transport error
fn network_code(err: &reqwest::Error) -> NetworkErrorCode {
    if err.is_timeout() {
        return NetworkErrorCode::TimedOut;
    }

    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return NetworkErrorCode::from_io_kind(io_err.kind());
        }
        source = inner.source();
    }

    if err.is_connect() {
        NetworkErrorCode::ConnectionRefused
    } else {
        NetworkErrorCode::Other("request".to_string())
    }
}
