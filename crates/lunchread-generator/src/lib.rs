//! # lunchread-generator
//!
//! The lunch read generation pipeline:
//! - [`MessagesClient`]: Messages API calls run through the retry executor
//! - [`LunchReadGenerator`]: prompts, concurrent bilingual generation, extraction
//! - [`ContentFile`]: backup and insertion into the `lunchReads` JS module
//! - [`GitPublisher`]: commit and push of the updated content file

pub mod article;
pub mod client;
pub mod content_file;
pub mod error;
pub mod extract;
pub mod generator;
pub mod git;
pub mod topics;
pub mod wire;

pub use article::{generate_id, publish_date, Locale, LocalizedArticle, LunchRead};
pub use client::MessagesClient;
pub use content_file::{format_entry, insert_entry, ContentFile};
pub use error::{Error, LocaleFailure, Result};
pub use extract::{extract_article, ExtractedArticle};
pub use generator::{build_prompt, LunchReadGenerator};
pub use git::{GitPublisher, GitReport};
pub use topics::{find_topic, select_topic, Topic, TOPICS};
