//! `namefix status`: one indexing status query.

use anyhow::Result;
use console::style;
use std::path::Path;

use namefix::config::NamefixConfig;
use namefix::prompt::{validate_branch, validate_repository};
use namefix::remote::{AnalysisService, GreptileClient, JobHandle, JobStatus, Remote};
use namefix::ui::icons::{CHECK, CLOCK, CROSS};

pub async fn cmd_status(project_dir: &Path, remote: Remote, repo: &str, branch: &str) -> Result<()> {
    validate_repository(repo).map_err(anyhow::Error::msg)?;
    validate_branch(branch).map_err(anyhow::Error::msg)?;

    let config = NamefixConfig::load(project_dir)?;
    let client = GreptileClient::new(&config.base_url, config.credentials()?)?;

    let handle = JobHandle::new(remote, repo, branch);
    let status = client.index_status(&handle).await?;

    let icon = match status {
        JobStatus::Completed => &CHECK,
        JobStatus::Failed => &CROSS,
        _ => &CLOCK,
    };
    println!("{}{} {}", icon, style(&handle).bold(), status);
    Ok(())
}
