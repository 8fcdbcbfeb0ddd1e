//! Rename engine.
//!
//! Applies rename directives to a file tree, one directive at a time and in
//! list order. Each directive is a full read-modify-write cycle on one file:
//! the file is loaded once, every whole-word occurrence of the old name is
//! replaced in a single pass, and the file is rewritten atomically only when
//! its content actually changed. Re-running a batch is therefore a no-op.
//!
//! Per-directive problems never abort the batch; they are reported as
//! [`RenameOutcome`]s.

pub(crate) mod lexical;

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::directives::RenameDirective;

pub use lexical::{is_identifier_char, normalize_path, replace_whole_word};
use lexical::{KernelOptions, Step};

/// What happened to one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenameOutcome {
    /// Content changed and was written (or would be, in a dry run).
    Applied { replacements: usize },
    /// File read, old name absent as a whole word.
    NoMatch,
    /// Target does not exist as a regular file.
    MissingFile,
    /// Target path leaves the root and the run does not allow it.
    RejectedPath,
    /// Target exists but could not be read as text or written.
    Failed { reason: String },
}

impl RenameOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RenameOutcome::Applied { .. } => "applied",
            RenameOutcome::NoMatch => "no_match",
            RenameOutcome::MissingFile => "missing_file",
            RenameOutcome::RejectedPath => "rejected_path",
            RenameOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, RenameOutcome::Applied { .. })
    }
}

impl From<Step> for RenameOutcome {
    fn from(step: Step) -> Self {
        match step {
            Step::Rewritten { replacements } => RenameOutcome::Applied { replacements },
            Step::Unchanged => RenameOutcome::NoMatch,
            Step::Missing => RenameOutcome::MissingFile,
            Step::OutsideRoot => RenameOutcome::RejectedPath,
            Step::Failed(reason) => RenameOutcome::Failed { reason },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Compute outcomes without writing anything.
    pub dry_run: bool,
    /// Honour directive paths that climb above the root.
    pub allow_outside_root: bool,
}

/// Applies directives relative to a root directory.
#[derive(Debug, Clone)]
pub struct RenameEngine {
    root: PathBuf,
    options: EngineOptions,
}

impl RenameEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply a single directive.
    pub fn apply(&self, directive: &RenameDirective) -> RenameOutcome {
        let step = lexical::rename_in_file(
            &self.root,
            &directive.old_name,
            &directive.new_name,
            &directive.file_path,
            KernelOptions {
                write: !self.options.dry_run,
                allow_outside_root: self.options.allow_outside_root,
            },
        );
        let outcome = RenameOutcome::from(step);

        match &outcome {
            RenameOutcome::Applied { replacements } => debug!(
                file = directive.normalized_path(),
                old = %directive.old_name,
                new = %directive.new_name,
                replacements,
                dry_run = self.options.dry_run,
                "Applied rename"
            ),
            RenameOutcome::NoMatch => debug!(
                file = directive.normalized_path(),
                old = %directive.old_name,
                "No whole-word match"
            ),
            RenameOutcome::MissingFile => {
                warn!(file = directive.normalized_path(), "File does not exist")
            }
            RenameOutcome::RejectedPath => warn!(
                file = directive.normalized_path(),
                "Path escapes the working root, skipped"
            ),
            RenameOutcome::Failed { reason } => {
                warn!(file = directive.normalized_path(), %reason, "Rename failed")
            }
        }

        outcome
    }

    /// Apply every directive in order and return one outcome per directive.
    pub fn apply_all(&self, directives: &[RenameDirective]) -> Vec<RenameOutcome> {
        directives.iter().map(|d| self.apply(d)).collect()
    }

    /// Apply every directive in order and pair each with its outcome.
    pub fn run(&self, directives: &[RenameDirective]) -> RenameReport {
        let entries: Vec<ReportEntry> = directives
            .iter()
            .map(|directive| ReportEntry {
                directive: directive.clone(),
                outcome: self.apply(directive),
            })
            .collect();

        let report = RenameReport {
            dry_run: self.options.dry_run,
            entries,
        };
        let counts = report.counts();
        info!(
            applied = counts.applied,
            no_match = counts.no_match,
            missing_file = counts.missing_file,
            rejected_path = counts.rejected_path,
            failed = counts.failed,
            dry_run = self.options.dry_run,
            "Rename batch finished"
        );
        report
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub directive: RenameDirective,
    #[serde(flatten)]
    pub outcome: RenameOutcome,
}

/// Per-directive outcomes of one batch, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    pub dry_run: bool,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub applied: usize,
    pub no_match: usize,
    pub missing_file: usize,
    pub rejected_path: usize,
    pub failed: usize,
}

impl RenameReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &RenameOutcome> {
        self.entries.iter().map(|entry| &entry.outcome)
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for outcome in self.outcomes() {
            match outcome {
                RenameOutcome::Applied { .. } => counts.applied += 1,
                RenameOutcome::NoMatch => counts.no_match += 1,
                RenameOutcome::MissingFile => counts.missing_file += 1,
                RenameOutcome::RejectedPath => counts.rejected_path += 1,
                RenameOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// Total number of identifier occurrences replaced across the batch.
    pub fn total_replacements(&self) -> usize {
        self.outcomes()
            .map(|outcome| match outcome {
                RenameOutcome::Applied { replacements } => *replacements,
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.counts().failed > 0
    }
}
