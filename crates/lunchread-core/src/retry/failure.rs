//! Failure model for remote calls
//!
//! A [`Failure`] is what an operation hands back to the executor when an
//! attempt does not produce a usable result. The kind is a closed set: an HTTP
//! status failure carries its status and response hints, a network failure
//! carries an error code, and a malformed-response failure carries neither.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io;

use crate::types::NetworkErrorCode;

/// Header that asks the client to retry regardless of status
pub const FORCE_RETRY_HEADER: &str = "x-should-retry";

/// Header carrying a server-supplied wait, in whole seconds
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Response headers relevant to retry decisions
///
/// The raw headers are kept (names lower-cased) for logging; the two headers the
/// classifier and delay calculator care about are parsed once up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHints {
    headers: BTreeMap<String, String>,
    force_retry: bool,
    retry_after_secs: Option<u64>,
}

impl ResponseHints {
    /// Build hints from raw header pairs
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers: BTreeMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();

        // Only the exact literal counts; "True" or "1" do not force a retry
        let force_retry = headers
            .get(FORCE_RETRY_HEADER)
            .is_some_and(|value| value == "true");
        let retry_after_secs = headers
            .get(RETRY_AFTER_HEADER)
            .and_then(|value| parse_retry_after(value));

        Self {
            headers,
            force_retry,
            retry_after_secs,
        }
    }

    /// Whether the server asked for a retry regardless of status
    pub fn force_retry(&self) -> bool {
        self.force_retry
    }

    /// Server-supplied wait in seconds, if present and numeric
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }

    /// Raw header value by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All raw headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Parse the leading integer of a `retry-after` value
///
/// Mirrors an integer parse: surrounding whitespace is ignored and trailing
/// garbage after the digits is dropped, so "10" and "10s" both yield 10.
/// HTTP-date values have no leading digits and yield `None`.
fn parse_retry_after(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..digits_end].parse().ok()
}

/// The kind of a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered with a non-success status
    Http {
        /// HTTP status code
        status: u16,
        /// Parsed response headers
        hints: ResponseHints,
    },

    /// The request never produced an HTTP response
    Network {
        /// Transport error code
        code: NetworkErrorCode,
    },

    /// The call succeeded at the transport level but the payload was unusable
    MalformedResponse,
}

impl FailureKind {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Http { .. } => "http",
            FailureKind::Network { .. } => "network",
            FailureKind::MalformedResponse => "malformed-response",
        }
    }
}

/// A failed attempt, as seen by the classifier
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Failure {
    /// An HTTP status failure
    pub fn http(status: u16, hints: ResponseHints, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Http { status, hints },
            message: message.into(),
            source: None,
        }
    }

    /// A network failure
    pub fn network(code: NetworkErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network { code },
            message: message.into(),
            source: None,
        }
    }

    /// A malformed-response failure
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::MalformedResponse,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying error
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The failure kind
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, for HTTP failures
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            FailureKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response hints, for HTTP failures
    pub fn hints(&self) -> Option<&ResponseHints> {
        match &self.kind {
            FailureKind::Http { hints, .. } => Some(hints),
            _ => None,
        }
    }

    /// Network error code, for network failures
    pub fn error_code(&self) -> Option<&NetworkErrorCode> {
        match &self.kind {
            FailureKind::Network { code } => Some(code),
            _ => None,
        }
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        let code = NetworkErrorCode::from_io_kind(err.kind());
        Failure::network(code, err.to_string()).with_source(err)
    }
}
