//! Article extraction from generated Markdown
//!
//! The model is asked for a title, a few tags and a one-sentence excerpt, but
//! the exact layout varies. Extraction is lenient: every field has a fallback,
//! so an article is always produced from any non-empty text.

use std::sync::LazyLock;

use regex::Regex;

use crate::article::Locale;
use crate::topics::Topic;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s(.+?)(?:\n|$)").expect("valid title regex"));

static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tags?:?\s*\[([^\]]+)\]").expect("valid tags regex"));

static EXCERPT_EN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)excerpt:?\s*["'](.+?)["']"#).expect("valid excerpt regex"));

static EXCERPT_FR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)résumé:?\s*["'](.+?)["']"#).expect("valid résumé regex"));

/// Metadata lines removed from the article body, first occurrence each
static METADATA_LINES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r#"(?im)^title:?\s*["'](.+?)["']\s*$"#,
        r"(?im)^tags:?\s*\[.+?\]\s*$",
        r#"(?im)^excerpt:?\s*["'](.+?)["']\s*$"#,
        r#"(?im)^résumé:?\s*["'](.+?)["']\s*$"#,
    ]
    .map(|pattern| Regex::new(pattern).expect("valid metadata regex"))
});

/// Fields pulled out of one generated article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub content: String,
}

/// Extract title, tags, excerpt and cleaned body from generated text
pub fn extract_article(text: &str, topic: &Topic, locale: Locale) -> ExtractedArticle {
    ExtractedArticle {
        title: extract_title(text, topic),
        tags: extract_tags(text, topic, locale),
        excerpt: extract_excerpt(text, topic, locale),
        content: clean_content(text),
    }
}

/// First level-one heading, or `Article on <topic>`
pub fn extract_title(text: &str, topic: &Topic) -> String {
    TITLE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| format!("Article on {}", topic.name))
}

/// Tags from a `tags: [a, b]` line, or the locale's generic tag plus the topic
pub fn extract_tags(text: &str, topic: &Topic, locale: Locale) -> Vec<String> {
    match TAGS.captures(text).and_then(|caps| caps.get(1)) {
        Some(list) => list
            .as_str()
            .split(',')
            .map(|tag| tag.trim().replace(['"', '\''], ""))
            .collect(),
        None => vec![locale.default_tag().to_string(), topic.display_name()],
    }
}

/// Explicit excerpt, else the first sentence of the second paragraph
pub fn extract_excerpt(text: &str, topic: &Topic, locale: Locale) -> String {
    let pattern = match locale {
        Locale::En => &*EXCERPT_EN,
        Locale::Fr => &*EXCERPT_FR,
    };

    if let Some(excerpt) = pattern.captures(text).and_then(|caps| caps.get(1)) {
        return excerpt.as_str().trim().to_string();
    }

    let paragraph = text.split("\n\n").nth(1).unwrap_or_default();
    paragraph
        .split(['.', '!', '?'])
        .map(str::trim)
        .find(|sentence| !sentence.is_empty())
        .map(|sentence| format!("{}.", sentence))
        .unwrap_or_else(|| format!("A guide to {}", topic.name))
}

/// Strip model-added metadata lines and surrounding whitespace
pub fn clean_content(text: &str) -> String {
    let mut cleaned = text.to_string();
    for pattern in METADATA_LINES.iter() {
        cleaned = pattern.replace(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::find_topic;

    fn topic() -> &'static Topic {
        find_topic("api-design").unwrap()
    }

    const ARTICLE: &str = "# Designing APIs That Last\n\nGood APIs are boring. They change slowly!\n\n## Versioning\n\nUse headers.\n\ntags: [\"API\", 'REST', Design]\nexcerpt: \"How to design APIs that survive their first year.\"\n";

    #[test]
    fn test_extract_full_article() {
        let article = extract_article(ARTICLE, topic(), Locale::En);
        assert_eq!(article.title, "Designing APIs That Last");
        assert_eq!(article.tags, vec!["API", "REST", "Design"]);
        assert_eq!(
            article.excerpt,
            "How to design APIs that survive their first year."
        );
        assert!(article.content.starts_with("# Designing APIs That Last"));
        assert!(!article.content.contains("tags:"));
        assert!(!article.content.contains("excerpt:"));
        assert!(article.content.ends_with("Use headers."));
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(extract_title("no heading here", topic()), "Article on api-design");
        assert_eq!(extract_title("## Only a subheading", topic()), "Article on api-design");
    }

    #[test]
    fn test_tags_fallback_is_localized() {
        assert_eq!(
            extract_tags("plain text", topic(), Locale::En),
            vec!["Technology", "api design"]
        );
        assert_eq!(
            extract_tags("plain text", topic(), Locale::Fr),
            vec!["Technologie", "api design"]
        );
    }

    #[test]
    fn test_excerpt_from_second_paragraph() {
        let text = "# Title\n\nFirst sentence here! Second one.\n\nMore.";
        assert_eq!(
            extract_excerpt(text, topic(), Locale::En),
            "First sentence here."
        );
    }

    #[test]
    fn test_excerpt_final_fallback() {
        assert_eq!(
            extract_excerpt("# Title only", topic(), Locale::En),
            "A guide to api-design"
        );
    }

    #[test]
    fn test_french_excerpt_uses_resume_label() {
        let text = "# Titre\n\nrésumé: \"Un guide pratique.\"\nexcerpt: \"ignored\"\n\nCorps.";
        assert_eq!(extract_excerpt(text, topic(), Locale::Fr), "Un guide pratique.");

        let cleaned = clean_content(text);
        assert!(!cleaned.contains("résumé:"));
        assert!(!cleaned.contains("excerpt:"));
    }

    #[test]
    fn test_clean_content_removes_title_line() {
        let text = "title: \"Meta title\"\n# Heading\n\nBody";
        assert_eq!(clean_content(text), "# Heading\n\nBody");
    }
}
