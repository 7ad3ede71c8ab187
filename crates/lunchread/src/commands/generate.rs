//! Generate command

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use lunchread_core::types::RuntimeConfig;
use lunchread_generator::{
    find_topic, format_entry, publish_date, select_topic, ContentFile, Error as GeneratorError,
    GitPublisher, LunchReadGenerator, Topic, TOPICS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::{build_client, load_config};
use crate::cli::GenerateArgs;
use crate::output;

pub async fn run(args: GenerateArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, &args);

    let client = build_client(&config, &args.api)?;

    if !args.skip_check {
        let spinner = output::spinner("Validating API connection...");
        let result = client.ping().await;
        spinner.finish_and_clear();
        result.context("Failed to validate API connection")?;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let topic = resolve_topic(args.topic.as_deref(), &mut rng)?;
    let date = publish_date(chrono::Local::now().date_naive(), &mut rng);
    info!(topic = topic.name, date = %date, "Starting lunch read generation");

    let generator = LunchReadGenerator::new(client);
    let spinner = output::spinner(&format!("Generating lunch read about {}...", topic.name));
    let result = generator.generate(topic, date, &mut rng).await;
    spinner.finish_and_clear();

    let lunch_read = match result {
        Ok(lunch_read) => lunch_read,
        Err(GeneratorError::Generation {
            topic,
            completed,
            failures,
        }) => {
            for locale in &completed {
                output::info(&format!("{} content completed", locale));
            }
            for failure in &failures {
                output::error(&format!(
                    "{} content failed after {} attempt(s): {}",
                    failure.locale,
                    failure.error.attempts(),
                    failure.error.failure()
                ));
            }
            return Err(anyhow!("Failed to generate lunch read for topic {}", topic));
        }
        Err(err) => return Err(err.into()),
    };

    if args.dry_run {
        output::header(&format!("Lunch read {}", lunch_read.id));
        println!("{}", format_entry(&lunch_read));
        return Ok(());
    }

    let content_path = Utf8PathBuf::from(&config.content.file);
    let content_file = ContentFile::new(content_path.clone());

    if config.content.backup {
        match content_file.create_backup().await {
            Ok(backup) => output::info(&format!("Backup created at {}", backup)),
            Err(err) => output::warning(&format!("Could not back up {}: {}", content_path, err)),
        }
    }

    content_file
        .insert(&lunch_read)
        .await
        .with_context(|| format!("Failed to update {}", content_path))?;
    output::success(&format!("Added lunch read {}", lunch_read.id));

    if config.git.enabled {
        let publisher = GitPublisher::new(".", config.git.clone());
        match publisher.publish(&content_path, &lunch_read.id).await {
            Ok(report) if report.pushed => output::success("Committed and pushed"),
            Ok(_) => output::success("Committed"),
            Err(err) => output::warning(&format!(
                "Git operations failed, content file was still updated: {}",
                err
            )),
        }
    }

    output::header("Lunch read");
    output::kv("ID", &lunch_read.id);
    output::kv("Topic", topic.name);
    output::kv("Date", &date.to_string());
    output::kv("Title (en)", &lunch_read.en.title);
    output::kv("Title (fr)", &lunch_read.fr.title);
    Ok(())
}

/// Apply command-line flags over the resolved configuration
fn apply_overrides(config: &mut RuntimeConfig, args: &GenerateArgs) {
    if let Some(path) = &args.content_file {
        config.content.file = path.to_string();
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if args.no_backup {
        config.content.backup = false;
    }
    if args.no_git {
        config.git.enabled = false;
    }
    if args.no_push {
        config.git.push = false;
    }
}

fn resolve_topic(name: Option<&str>, rng: &mut StdRng) -> Result<&'static Topic> {
    match name {
        Some(name) => find_topic(name).ok_or_else(|| {
            let available: Vec<&str> = TOPICS.iter().map(|t| t.name).collect();
            anyhow!(
                "Unknown topic '{}'. Available topics: {}",
                name,
                available.join(", ")
            )
        }),
        None => Ok(select_topic(rng)),
    }
}
