//! Content file updates
//!
//! Lunch reads live in a JS module exporting a `lunchReads` object. New
//! entries are inserted as text directly after the opening brace of that
//! declaration, so the rest of the file is left untouched.

use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tracing::{debug, info};

use crate::article::{LocalizedArticle, LunchRead};
use crate::error::{Error, Result};

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+const\s+lunchReads\s*=\s*\{").expect("declaration regex is valid")
});

/// Spaces per nesting level
const INDENT: usize = 2;

/// A JS literal value, as written into the content file
#[derive(Debug, Clone, PartialEq)]
enum JsValue {
    Str(String),
    Array(Vec<JsValue>),
    Object(Vec<(String, JsValue)>),
}

impl JsValue {
    fn render(&self, indent: usize) -> String {
        let pad = " ".repeat(indent);
        let inner = " ".repeat(indent + INDENT);
        match self {
            JsValue::Str(s) => format!("\"{}\"", escape(s)),
            JsValue::Array(items) if items.is_empty() => "[]".to_string(),
            JsValue::Array(items) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| format!("{}{}", inner, item.render(indent + INDENT)))
                    .collect();
                format!("[\n{}\n{}]", items.join(",\n"), pad)
            }
            JsValue::Object(entries) if entries.is_empty() => "{}".to_string(),
            JsValue::Object(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| {
                        format!("{}{}: {}", inner, js_key(key), value.render(indent + INDENT))
                    })
                    .collect();
                format!("{{\n{}\n{}}}", entries.join(",\n"), pad)
            }
        }
    }
}

impl From<&LocalizedArticle> for JsValue {
    fn from(article: &LocalizedArticle) -> Self {
        JsValue::Object(vec![
            ("title".to_string(), JsValue::Str(article.title.clone())),
            ("date".to_string(), JsValue::Str(article.date.to_string())),
            (
                "tags".to_string(),
                JsValue::Array(article.tags.iter().cloned().map(JsValue::Str).collect()),
            ),
            ("excerpt".to_string(), JsValue::Str(article.excerpt.clone())),
            ("content".to_string(), JsValue::Str(article.content.clone())),
        ])
    }
}

/// Escape a string for a double-quoted JS literal
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn js_key(key: &str) -> String {
    if key.contains('-') {
        format!("\"{}\"", key)
    } else {
        key.to_string()
    }
}

/// Format a lunch read as an entry of the `lunchReads` object
pub fn format_entry(lunch_read: &LunchRead) -> String {
    let value = JsValue::Object(vec![
        ("fr".to_string(), JsValue::from(&lunch_read.fr)),
        ("en".to_string(), JsValue::from(&lunch_read.en)),
    ]);
    format!(
        "{}\"{}\": {}",
        " ".repeat(INDENT),
        escape(&lunch_read.id),
        value.render(INDENT)
    )
}

/// Insert a formatted entry right after the `lunchReads` opening brace
///
/// Returns `None` when the file has no such declaration.
pub fn insert_entry(source: &str, entry: &str) -> Option<String> {
    let position = DECLARATION.find(source)?.end();
    let (head, tail) = source.split_at(position);

    let is_empty = tail.trim_start().is_empty() || tail.trim_start().starts_with('}');
    let mut updated = String::with_capacity(source.len() + entry.len() + 2);
    updated.push_str(head);
    updated.push('\n');
    updated.push_str(entry);
    if is_empty {
        updated.push('\n');
    } else {
        updated.push(',');
    }
    updated.push_str(tail);
    Some(updated)
}

/// The JS module holding all lunch reads
#[derive(Debug, Clone)]
pub struct ContentFile {
    path: Utf8PathBuf,
}

impl ContentFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Path for a backup taken at `timestamp_ms`
    pub fn backup_path(&self, timestamp_ms: i64) -> Utf8PathBuf {
        let stem = self.path.file_stem().unwrap_or("content");
        let name = match self.path.extension() {
            Some(ext) => format!("{}.backup-{}.{}", stem, timestamp_ms, ext),
            None => format!("{}.backup-{}", stem, timestamp_ms),
        };
        self.path.with_file_name(name)
    }

    /// Copy the file aside before it is modified
    pub async fn create_backup(&self) -> Result<Utf8PathBuf> {
        let backup = self.backup_path(chrono::Utc::now().timestamp_millis());
        info!("Creating backup of {} at: {}", self.path, backup);
        tokio::fs::copy(&self.path, &backup).await?;
        Ok(backup)
    }

    /// Insert a new lunch read at the top of the `lunchReads` object
    pub async fn insert(&self, lunch_read: &LunchRead) -> Result<()> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(Error::content_file_not_found(self.path.as_str()));
        }

        debug!("Reading content file: {}", self.path);
        let source = tokio::fs::read_to_string(&self.path).await?;
        let updated = insert_entry(&source, &format_entry(lunch_read))
            .ok_or_else(|| Error::missing_declaration(self.path.as_str()))?;

        tokio::fs::write(&self.path, updated).await?;
        info!(id = %lunch_read.id, "Updated {} with new entry", self.path);
        Ok(())
    }
}
