//! Layered configuration for namefix.
//!
//! Values come from `.namefix/namefix.toml`, then the environment (including a
//! project-local `.env`), then command-line flags, each layer overriding the
//! previous one.
//!
//! # Configuration File Format
//!
//! ```toml
//! [remote]
//! base_url = "https://api.greptile.com/v2"
//! session_id = "repo-improvement-session"
//!
//! [poll]
//! interval_secs = 30
//! backoff = 1.0
//! max_interval_secs = 300
//! max_attempts = 240
//! timeout_secs = 7200
//! fail_fast = false
//!
//! [rename]
//! allow_outside_root = false
//!
//! [output]
//! plan_file = ".namefix/plan.json"
//! replay_file = "replace.rs"
//! ```
//!
//! Credentials are never read from the file: `GREPTILE_API_KEY` and
//! `GITHUB_TOKEN` must come from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::orchestrator::{DEFAULT_SESSION_ID, PollPolicy, poll};
use crate::remote::Credentials;
use crate::remote::client::DEFAULT_BASE_URL;

/// Directory holding namefix state inside a project.
pub const NAMEFIX_DIR: &str = ".namefix";
pub const CONFIG_FILE: &str = "namefix.toml";

pub const API_KEY_VAR: &str = "GREPTILE_API_KEY";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const BASE_URL_VAR: &str = "NAMEFIX_BASE_URL";
pub const POLL_INTERVAL_VAR: &str = "NAMEFIX_POLL_INTERVAL_SECS";
pub const MAX_ATTEMPTS_VAR: &str = "NAMEFIX_MAX_ATTEMPTS";

pub fn get_namefix_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(NAMEFIX_DIR)
}

pub fn config_path(project_dir: &Path) -> PathBuf {
    get_namefix_dir(project_dir).join(CONFIG_FILE)
}

/// `[remote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_id: default_session_id(),
        }
    }
}

/// `[poll]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_backoff")]
    pub backoff: f64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_interval_secs() -> u64 {
    poll::DEFAULT_INTERVAL.as_secs()
}

fn default_backoff() -> f64 {
    1.0
}

fn default_max_interval_secs() -> u64 {
    poll::DEFAULT_MAX_INTERVAL.as_secs()
}

fn default_max_attempts() -> u32 {
    poll::DEFAULT_MAX_ATTEMPTS
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            backoff: default_backoff(),
            max_interval_secs: default_max_interval_secs(),
            max_attempts: default_max_attempts(),
            timeout_secs: None,
            fail_fast: false,
        }
    }
}

impl PollSection {
    pub fn policy(&self) -> PollPolicy {
        let mut policy = PollPolicy::fixed(Duration::from_secs(self.interval_secs), self.max_attempts)
            .with_backoff(self.backoff, Duration::from_secs(self.max_interval_secs))
            .with_fail_fast(self.fail_fast);
        if let Some(secs) = self.timeout_secs {
            policy = policy.with_timeout(Duration::from_secs(secs));
        }
        policy
    }
}

/// `[rename]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameSection {
    #[serde(default)]
    pub allow_outside_root: bool,
}

/// `[output]` section. Relative paths resolve against the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_plan_file")]
    pub plan_file: PathBuf,
    #[serde(default = "default_replay_file")]
    pub replay_file: PathBuf,
}

fn default_plan_file() -> PathBuf {
    PathBuf::from(NAMEFIX_DIR).join("plan.json")
}

fn default_replay_file() -> PathBuf {
    PathBuf::from("replace.rs")
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            plan_file: default_plan_file(),
            replay_file: default_replay_file(),
        }
    }
}

/// Contents of `.namefix/namefix.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamefixToml {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub poll: PollSection,
    #[serde(default)]
    pub rename: RenameSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl NamefixToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Human-readable warnings for values that will not work.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.poll.policy().validate();
        if !self.remote.base_url.starts_with("http://")
            && !self.remote.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "remote.base_url should start with http:// or https://, got '{}'",
                self.remote.base_url
            ));
        }
        if self.remote.session_id.trim().is_empty() {
            warnings.push("remote.session_id must not be empty".to_string());
        }
        if self.poll.interval_secs == 0 {
            warnings.push("poll.interval_secs of 0 polls the service without pause".to_string());
        }
        warnings
    }
}

/// Effective runtime configuration.
#[derive(Debug, Clone)]
pub struct NamefixConfig {
    pub project_dir: PathBuf,
    pub base_url: String,
    pub session_id: String,
    pub poll: PollPolicy,
    pub allow_outside_root: bool,
    pub plan_file: PathBuf,
    pub replay_file: PathBuf,
    /// Whether `.namefix/namefix.toml` existed.
    pub from_file: bool,
}

impl NamefixConfig {
    /// Load the file layer and the process environment.
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::load_with_env(project_dir, |key| std::env::var(key).ok())
    }

    /// Load the file layer, then apply overrides from `env`.
    pub fn load_with_env<F>(project_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = config_path(project_dir);
        let from_file = path.exists();
        let toml = if from_file {
            NamefixToml::load(&path)?
        } else {
            NamefixToml::default()
        };

        let mut config = Self::from_toml(project_dir, &toml, from_file);
        config.apply_env(env)?;

        let problems = config.poll.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid {
                key: "poll".to_string(),
                message: problems.join("; "),
            }
            .into());
        }
        Ok(config)
    }

    pub fn from_toml(project_dir: &Path, toml: &NamefixToml, from_file: bool) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            base_url: toml.remote.base_url.clone(),
            session_id: toml.remote.session_id.clone(),
            poll: toml.poll.policy(),
            allow_outside_root: toml.rename.allow_outside_root,
            plan_file: project_dir.join(&toml.output.plan_file),
            replay_file: project_dir.join(&toml.output.replay_file),
            from_file,
        }
    }

    fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(raw) = env(POLL_INTERVAL_VAR) {
            let secs = parse_env_number::<u64>(POLL_INTERVAL_VAR, &raw)?;
            self.poll.interval = Duration::from_secs(secs);
            self.poll.max_interval = self.poll.max_interval.max(self.poll.interval);
        }
        if let Some(raw) = env(MAX_ATTEMPTS_VAR) {
            self.poll.max_attempts = parse_env_number::<u32>(MAX_ATTEMPTS_VAR, &raw)?;
        }
        Ok(())
    }

    /// Resolve credentials from the environment.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        credentials_from(|key| std::env::var(key).ok())
    }
}

pub fn credentials_from<F>(env: F) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &'static str| {
        env(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(key))
    };
    Ok(Credentials {
        api_key: required(API_KEY_VAR)?,
        github_token: required(GITHUB_TOKEN_VAR)?,
    })
}

fn parse_env_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got '{}'", raw),
    })
}

/// Load `<project_dir>/.env` into the process environment if it exists.
/// Variables already set are left alone.
pub fn load_dotenv(project_dir: &Path) -> Result<()> {
    let path = project_dir.join(".env");
    if path.exists() {
        dotenvy::from_path(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }
    Ok(())
}
