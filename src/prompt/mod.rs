//! Interactive input for `namefix suggest`.
//!
//! Collects the remote, repository and branch, re-asking until each value
//! passes validation. The validators are also used for values given as flags,
//! so nothing unvalidated reaches the orchestrator.

use anyhow::{Context, Result};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use regex::Regex;
use std::sync::LazyLock;

use crate::remote::Remote;

static REPOSITORY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9-]+/[a-zA-Z0-9_-]+$").unwrap());

static BRANCH_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

/// Check an `owner/name` repository identifier.
pub fn validate_repository(repository: &str) -> Result<(), String> {
    if REPOSITORY_REGEX.is_match(repository) {
        Ok(())
    } else {
        Err("Invalid format. Please use the format <owner>/<repo-name>.".to_string())
    }
}

/// Check a branch name: letters, digits, hyphens and underscores only.
pub fn validate_branch(branch: &str) -> Result<(), String> {
    if BRANCH_REGEX.is_match(branch) {
        Ok(())
    } else {
        Err(
            "Invalid branch name. Please use only letters, numbers, hyphens, or underscores."
                .to_string(),
        )
    }
}

pub fn choose_remote() -> Result<Remote> {
    let options = &["GitHub", "GitLab"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Where is the repository hosted?")
        .items(options)
        .default(0)
        .interact()
        .context("Failed to read remote choice")?;

    match selection {
        0 => Ok(Remote::Github),
        1 => Ok(Remote::Gitlab),
        _ => unreachable!(),
    }
}

pub fn ask_repository() -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Repository (<owner>/<repo-name>)")
        .validate_with(|input: &String| validate_repository(input))
        .interact_text()
        .context("Failed to read repository")
}

pub fn ask_branch() -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Branch")
        .default("main".to_string())
        .validate_with(|input: &String| validate_branch(input))
        .interact_text()
        .context("Failed to read branch")
}

/// Target of a suggestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub remote: Remote,
    pub repository: String,
    pub branch: String,
}

/// Fill in whatever was not given on the command line.
///
/// With `interactive == false` a missing value is an error instead of a prompt.
pub fn resolve_target(
    remote: Option<Remote>,
    repository: Option<String>,
    branch: Option<String>,
    interactive: bool,
) -> Result<Target> {
    let remote = match remote {
        Some(remote) => remote,
        None if interactive => choose_remote()?,
        None => anyhow::bail!("--remote is required when not running interactively"),
    };

    let repository = match repository {
        Some(repository) => {
            validate_repository(&repository).map_err(anyhow::Error::msg)?;
            repository
        }
        None if interactive => ask_repository()?,
        None => anyhow::bail!("--repo is required when not running interactively"),
    };

    let branch = match branch {
        Some(branch) => {
            validate_branch(&branch).map_err(anyhow::Error::msg)?;
            branch
        }
        None if interactive => ask_branch()?,
        None => anyhow::bail!("--branch is required when not running interactively"),
    };

    Ok(Target {
        remote,
        repository,
        branch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_repositories() {
        assert!(validate_repository("owner/repo").is_ok());
        assert!(validate_repository("my-org/my_repo-2").is_ok());
    }

    #[test]
    fn test_invalid_repositories() {
        assert!(validate_repository("owner").is_err());
        assert!(validate_repository("owner/repo/extra").is_err());
        assert!(validate_repository("own_er/repo").is_err());
        assert!(validate_repository("owner/re.po").is_err());
        assert!(validate_repository("").is_err());
    }

    #[test]
    fn test_valid_branches() {
        assert!(validate_branch("main").is_ok());
        assert!(validate_branch("feature-x_2").is_ok());
    }

    #[test]
    fn test_invalid_branches() {
        assert!(validate_branch("feature/x").is_err());
        assert!(validate_branch("a:b").is_err());
        assert!(validate_branch("").is_err());
    }

    #[test]
    fn test_resolve_target_from_flags() {
        let target = resolve_target(
            Some(Remote::Gitlab),
            Some("team/app".to_string()),
            Some("dev".to_string()),
            false,
        )
        .unwrap();
        assert_eq!(
            target,
            Target {
                remote: Remote::Gitlab,
                repository: "team/app".to_string(),
                branch: "dev".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_target_rejects_invalid_flag() {
        let err = resolve_target(
            Some(Remote::Github),
            Some("not a repo".to_string()),
            Some("main".to_string()),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid format"));
    }

    #[test]
    fn test_resolve_target_missing_value_non_interactive() {
        let err = resolve_target(Some(Remote::Github), Some("o/r".to_string()), None, false)
            .unwrap_err();
        assert!(err.to_string().contains("--branch"));
    }
}
