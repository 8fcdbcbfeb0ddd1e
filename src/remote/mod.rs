//! Remote analysis service.
//!
//! The orchestrator only talks to the service through the [`AnalysisService`]
//! trait; [`GreptileClient`] is the HTTP implementation used by the binary and
//! tests substitute scripted doubles.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RemoteError;

pub use client::{Credentials, GreptileClient};

/// Code host the repository lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Remote {
    #[default]
    Github,
    Gitlab,
}

impl std::fmt::Display for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remote::Github => write!(f, "github"),
            Remote::Gitlab => write!(f, "gitlab"),
        }
    }
}

impl std::str::FromStr for Remote {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(Remote::Github),
            "gitlab" => Ok(Remote::Gitlab),
            _ => anyhow::bail!("Invalid remote '{}'. Valid values: github, gitlab", s),
        }
    }
}

/// Identifies one indexing job.
///
/// Built locally as `remote:branch:repository`, so polling needs no
/// server-issued ticket. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

/// The three parts a [`JobHandle`] is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    pub remote: String,
    pub repository: String,
    pub branch: String,
}

impl JobHandle {
    pub const SEPARATOR: char = ':';

    pub fn new(remote: Remote, repository: &str, branch: &str) -> Self {
        Self(format!(
            "{}{sep}{}{sep}{}",
            remote,
            branch,
            repository,
            sep = Self::SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the handle back into remote, branch and repository.
    ///
    /// Branch names cannot contain the separator; repositories may contain
    /// anything after it.
    pub fn repository_ref(&self) -> Result<RepositoryRef, RemoteError> {
        let mut parts = self.0.splitn(3, Self::SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(remote), Some(branch), Some(repository))
                if !remote.is_empty() && !branch.is_empty() && !repository.is_empty() =>
            {
                Ok(RepositoryRef {
                    remote: remote.to_string(),
                    repository: repository.to_string(),
                    branch: branch.to_string(),
                })
            }
            _ => Err(RemoteError::InvalidHandle(self.0.clone())),
        }
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Indexing status as reported by the service.
///
/// Only `Completed` is terminal. Unknown strings are kept verbatim in `Other`
/// and polling continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "completed" => JobStatus::Completed,
            "pending" | "queued" | "submitted" => JobStatus::Pending,
            "in-progress" | "in_progress" | "processing" | "cloning" => JobStatus::InProgress,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::InProgress => write!(f, "in-progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Body of an indexing submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRequest {
    pub remote: Remote,
    pub repository: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMessage {
    pub id: String,
    pub content: String,
    pub role: String,
}

/// Body of a natural-language query scoped to indexed repositories.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub messages: Vec<QueryMessage>,
    pub repositories: Vec<RepositoryRef>,
    /// Enhanced-reasoning mode.
    pub genius: bool,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// The operations the orchestrator needs from the analysis service.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit an indexing job. Success means accepted/queued.
    async fn submit_index(&self, request: &IndexRequest) -> Result<(), RemoteError>;

    /// Current status of the job identified by `handle`.
    async fn index_status(&self, handle: &JobHandle) -> Result<JobStatus, RemoteError>;

    /// Run one query and return the raw response body.
    async fn query(&self, request: &QueryRequest) -> Result<String, RemoteError>;
}
