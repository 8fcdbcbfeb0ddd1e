//! Rename directives and plans.
//!
//! A directive is one `(old_name, new_name, file_path)` instruction. Directives
//! arrive from the analysis service as free text, are parsed strictly at the
//! boundary (see [`parser`]) and persisted as a [`RenamePlan`] so a batch can be
//! reviewed, applied later, or replayed without contacting the service again.

pub mod parser;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::rename::normalize_path;

pub use parser::{parse_directive_list, parse_response};

/// The question sent to the analysis service.
///
/// Asks for a fixed shape so the reply can be parsed strictly.
pub const SUGGESTION_PROMPT: &str = "find all poorly named variables and come up with better names. \
Return just a JSON array of arrays, no additional text: \
[[\"bad variable name\", \"new variable name\", \"filename\"], ...].";

/// One instruction to rename an identifier within one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameDirective {
    pub old_name: String,
    pub new_name: String,
    pub file_path: String,
}

impl RenameDirective {
    pub fn new(
        old_name: impl Into<String>,
        new_name: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            file_path: file_path.into(),
        }
    }

    /// The file path with a single leading separator removed.
    pub fn normalized_path(&self) -> &str {
        normalize_path(&self.file_path)
    }
}

impl std::fmt::Display for RenameDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} in {}",
            self.old_name,
            self.new_name,
            self.normalized_path()
        )
    }
}

/// A persisted directive list with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub generated_at: DateTime<Utc>,
    /// Job handle the directives were obtained from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub directives: Vec<RenameDirective>,
}

impl RenamePlan {
    pub fn new(directives: Vec<RenameDirective>, source: Option<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            source,
            directives,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plan file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize plan")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write plan file: {}", path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
