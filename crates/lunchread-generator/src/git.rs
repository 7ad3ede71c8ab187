//! Publishing the content file through git

use camino::{Utf8Path, Utf8PathBuf};
use lunchread_core::types::GitWorkflowConfig;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// What a publish run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GitReport {
    pub committed: bool,
    pub pushed: bool,
}

/// Commits (and optionally pushes) the content file in a repository
#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_dir: Utf8PathBuf,
    config: GitWorkflowConfig,
}

impl GitPublisher {
    pub fn new(repo_dir: impl Into<Utf8PathBuf>, config: GitWorkflowConfig) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            config,
        }
    }

    /// Commit message for a lunch read id
    pub fn commit_message(&self, id: &str) -> String {
        format!("{}: {}", self.config.commit_message_prefix, id)
    }

    /// Add and commit `file`, then push when configured
    ///
    /// A push failure is returned as an error after the commit has been made;
    /// check the repository state before retrying.
    pub async fn publish(&self, file: &Utf8Path, id: &str) -> Result<GitReport> {
        let mut report = GitReport::default();
        if !self.config.enabled {
            debug!("Git workflow disabled");
            return Ok(report);
        }

        check_git_available().await?;

        info!("Adding {} to git", file);
        self.git(&["add", file.as_str()], "git add").await?;

        let message = self.commit_message(id);
        info!("Creating git commit with message: \"{}\"", message);
        self.git(&["commit", "-m", &message], "git commit").await?;
        report.committed = true;

        if self.config.push {
            info!("Pushing changes to remote repository");
            match &self.config.remote {
                Some(remote) => self.git(&["push", remote], "git push").await?,
                None => self.git(&["push"], "git push").await?,
            }
            report.pushed = true;
        }

        info!("Git operations completed successfully");
        Ok(report)
    }

    async fn git(&self, args: &[&str], label: &str) -> Result<()> {
        debug!("Running: git {}", args.join(" "));
        let output = Command::new("git")
            .current_dir(&self.repo_dir)
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git_operation(format!(
                "{} failed: {}",
                label,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Check if git is available in PATH
async fn check_git_available() -> Result<()> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .await
        .map_err(|_| Error::GitNotFound)?;

    if !output.status.success() {
        return Err(Error::GitNotFound);
    }

    Ok(())
}
