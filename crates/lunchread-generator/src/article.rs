//! Lunch read data model
//!
//! A lunch read is one article in two locales, sharing an id and a publish
//! date.

use std::fmt;

use chrono::{Days, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::extract::ExtractedArticle;

/// Supported article locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fr,
}

impl Locale {
    /// Two-letter code
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// Language name used in prompts
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "French",
        }
    }

    /// Generic tag used when the article suggests none
    pub fn default_tag(&self) -> &'static str {
        match self {
            Locale::En => "Technology",
            Locale::Fr => "Technologie",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One locale of a lunch read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedArticle {
    pub title: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub content: String,
}

impl LocalizedArticle {
    /// Attach a publish date to an extracted article
    pub fn from_extracted(article: ExtractedArticle, date: NaiveDate) -> Self {
        Self {
            title: article.title,
            date,
            tags: article.tags,
            excerpt: article.excerpt,
            content: article.content,
        }
    }
}

/// A complete bilingual lunch read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LunchRead {
    pub id: String,
    pub fr: LocalizedArticle,
    pub en: LocalizedArticle,
}

impl LunchRead {
    /// Assemble a lunch read, deriving the id from the English title
    pub fn assemble<R: Rng + ?Sized>(
        en: ExtractedArticle,
        fr: ExtractedArticle,
        date: NaiveDate,
        rng: &mut R,
    ) -> Self {
        let id = generate_id(&en.title, rng);
        Self {
            id,
            fr: LocalizedArticle::from_extracted(fr, date),
            en: LocalizedArticle::from_extracted(en, date),
        }
    }

    /// Article for a locale
    pub fn locale(&self, locale: Locale) -> &LocalizedArticle {
        match locale {
            Locale::En => &self.en,
            Locale::Fr => &self.fr,
        }
    }
}

/// Maximum length of the title-derived id prefix
const ID_PREFIX_LEN: usize = 20;

/// Build an id from a title: a normalised prefix plus 8 random hex chars
pub fn generate_id<R: Rng + ?Sized>(title: &str, rng: &mut R) -> String {
    let prefix: String = normalize_title(title).chars().take(ID_PREFIX_LEN).collect();
    let suffix: [u8; 4] = rng.random();
    let suffix: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", prefix, suffix)
}

/// Lower-case, drop punctuation, and join words with dashes
fn normalize_title(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut normalized = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                normalized.push('-');
            }
            in_space = true;
        } else {
            normalized.push(c);
            in_space = false;
        }
    }
    normalized
}

/// A publish date between 1 and 30 days after `today`
pub fn publish_date<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> NaiveDate {
    let offset = rng.random_range(1..=30u64);
    today.checked_add_days(Days::new(offset)).unwrap_or(today)
}
