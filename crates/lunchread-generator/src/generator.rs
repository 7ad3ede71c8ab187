//! Bilingual lunch read generation
//!
//! Both locales are generated concurrently, each through its own executor run.
//! The outcome of every locale is reported: a lunch read is only assembled
//! when both succeed, and a failure names which locales completed and which
//! did not.

use chrono::NaiveDate;
use lunchread_core::retry::RetryError;
use rand::Rng;
use tracing::{error, info};

use crate::article::{Locale, LunchRead};
use crate::client::MessagesClient;
use crate::error::{Error, LocaleFailure, Result};
use crate::extract::{extract_article, ExtractedArticle};
use crate::topics::Topic;

/// Build the article prompt for a topic and locale
pub fn build_prompt(topic: &Topic, locale: Locale) -> String {
    format!(
        "You are a technical writer creating a lunch read article about {description}. \n\
The article should be informative, technical but accessible, and include code examples where appropriate. \n\
Write the article in {language}.\n\
Include a title, a brief excerpt, and suggest 2-3 appropriate tags.\n\
Format the content in Markdown.\n\
\n\
Create a lunch read about {description}.\n\
The article should be 800-1200 words with:\n\
1. An attention-grabbing title\n\
2. A brief introduction\n\
3. 2-4 main sections with subheadings\n\
4. Practical code examples where appropriate\n\
5. A brief conclusion\n\
6. Use a friendly, professional tone\n\
7. Include 2-3 relevant tags\n\
8. Include a one-sentence excerpt that summarizes the article\n\
\n\
Target a technical audience with varying levels of expertise.",
        description = topic.description,
        language = locale.language_name(),
    )
}

/// Generates lunch reads through a [`MessagesClient`]
pub struct LunchReadGenerator {
    client: MessagesClient,
}

impl LunchReadGenerator {
    pub fn new(client: MessagesClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &MessagesClient {
        &self.client
    }

    /// Generate and extract one locale
    pub async fn generate_locale(
        &self,
        topic: &Topic,
        locale: Locale,
    ) -> std::result::Result<ExtractedArticle, RetryError> {
        info!(topic = topic.name, locale = %locale, "Generating content");
        let prompt = build_prompt(topic, locale);
        let operation = format!("generate-{}", locale);
        let text = self.client.complete(&prompt, &operation).await?;
        Ok(extract_article(&text, topic, locale))
    }

    /// Generate both locales and assemble the lunch read
    ///
    /// The id is derived from the English title with `rng`; both locales share
    /// `date`.
    pub async fn generate<R: Rng + Send + ?Sized>(
        &self,
        topic: &Topic,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<LunchRead> {
        let (en, fr) = tokio::join!(
            self.generate_locale(topic, Locale::En),
            self.generate_locale(topic, Locale::Fr),
        );

        info!(
            en = status_label(&en),
            fr = status_label(&fr),
            "Content generation progress"
        );

        match (en, fr) {
            (Ok(en), Ok(fr)) => {
                let lunch_read = LunchRead::assemble(en, fr, date, rng);
                info!(id = %lunch_read.id, date = %date, "Lunch read assembled");
                Ok(lunch_read)
            }
            (en, fr) => {
                let mut completed = Vec::new();
                let mut failures = Vec::new();
                for (locale, outcome) in [(Locale::En, en), (Locale::Fr, fr)] {
                    match outcome {
                        Ok(_) => completed.push(locale),
                        Err(err) => {
                            error!(
                                topic = topic.name,
                                locale = %locale,
                                attempts = err.attempts(),
                                "Content generation failed: {}",
                                err
                            );
                            failures.push(LocaleFailure { locale, error: err });
                        }
                    }
                }
                Err(Error::Generation {
                    topic: topic.name.to_string(),
                    completed,
                    failures,
                })
            }
        }
    }
}

fn status_label<T, E>(outcome: &std::result::Result<T, E>) -> &'static str {
    if outcome.is_ok() {
        "completed"
    } else {
        "failed"
    }
}
