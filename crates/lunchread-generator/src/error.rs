//! Error types for lunchread-generator

use lunchread_core::retry::RetryError;
use thiserror::Error;

use crate::article::Locale;

/// Result type alias using lunchread-generator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// One locale that could not be generated
#[derive(Debug)]
pub struct LocaleFailure {
    /// Which locale failed
    pub locale: Locale,
    /// Terminal outcome of the executor for that locale
    pub error: RetryError,
}

/// Generation pipeline error types
#[derive(Error, Debug)]
pub enum Error {
    /// No API key was supplied
    #[error("ANTHROPIC_API_KEY environment variable is not set")]
    MissingApiKey,

    /// HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The connection check failed
    #[error("Failed to validate API connection: {0}")]
    ApiConnection(#[source] RetryError),

    /// One or more locales failed to generate
    #[error(
        "Failed to generate lunch read for topic {topic}: {}",
        describe_failures(.failures)
    )]
    Generation {
        /// Topic name
        topic: String,
        /// Locales that succeeded
        completed: Vec<Locale>,
        /// Locales that failed, with their executor outcome
        failures: Vec<LocaleFailure>,
    },

    /// Content file does not exist
    #[error("Content file not found: {path}")]
    ContentFileNotFound { path: String },

    /// Content file has no `lunchReads` export
    #[error("Could not find lunchReads object declaration in {path}")]
    MissingDeclaration { path: String },

    /// Git operation failed
    #[error("Git operation failed: {message}")]
    GitOperation { message: String },

    /// Git command not found
    #[error("Git command not found. Please ensure git is installed and in PATH")]
    GitNotFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a git operation error
    pub fn git_operation(message: impl Into<String>) -> Self {
        Self::GitOperation {
            message: message.into(),
        }
    }

    /// Create a content-file-not-found error
    pub fn content_file_not_found(path: impl Into<String>) -> Self {
        Self::ContentFileNotFound { path: path.into() }
    }

    /// Create a missing-declaration error
    pub fn missing_declaration(path: impl Into<String>) -> Self {
        Self::MissingDeclaration { path: path.into() }
    }
}

fn describe_failures(failures: &[LocaleFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} content failed: {}", f.locale, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}
