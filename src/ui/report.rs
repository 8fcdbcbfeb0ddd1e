use console::style;

use crate::directives::RenameDirective;
use crate::rename::{RenameOutcome, RenameReport};
use crate::ui::icons::{BLOCKED, CROSS, FILE_MOD, MISSING, SKIP, SPARKLE};

/// One line per directive, as shown after a batch.
pub fn outcome_line(directive: &RenameDirective, outcome: &RenameOutcome, dry_run: bool) -> String {
    let file = directive.normalized_path();
    match outcome {
        RenameOutcome::Applied { replacements } => format!(
            "{}{} '{}' -> '{}' in {} ({} occurrence{})",
            FILE_MOD,
            if dry_run { "Would replace" } else { "Replaced" },
            directive.old_name,
            directive.new_name,
            file,
            replacements,
            if *replacements == 1 { "" } else { "s" }
        ),
        RenameOutcome::NoMatch => format!("{}No replacements needed for {}", SKIP, file),
        RenameOutcome::MissingFile => format!("{}File {} does not exist", MISSING, file),
        RenameOutcome::RejectedPath => format!(
            "{}Skipped {}: path leaves the project directory",
            BLOCKED, file
        ),
        RenameOutcome::Failed { reason } => format!("{}Failed on {}: {}", CROSS, file, reason),
    }
}

pub fn print_report(report: &RenameReport) {
    println!();
    for entry in &report.entries {
        let line = outcome_line(&entry.directive, &entry.outcome, report.dry_run);
        match entry.outcome {
            RenameOutcome::Applied { .. } => println!("  {}", style(line).green()),
            RenameOutcome::NoMatch => println!("  {}", style(line).dim()),
            RenameOutcome::MissingFile | RenameOutcome::RejectedPath => {
                println!("  {}", style(line).yellow())
            }
            RenameOutcome::Failed { .. } => println!("  {}", style(line).red()),
        }
    }

    let counts = report.counts();
    println!();
    println!(
        "{}{} applied, {} unchanged, {} missing, {} rejected, {} failed ({} replacements{})",
        SPARKLE,
        style(counts.applied).bold(),
        counts.no_match,
        counts.missing_file,
        counts.rejected_path,
        counts.failed,
        report.total_replacements(),
        if report.dry_run { ", dry run" } else { "" }
    );
}

pub fn print_directives(directives: &[RenameDirective]) {
    if directives.is_empty() {
        println!("  {}", style("(no directives)").dim());
        return;
    }
    let width = directives
        .iter()
        .map(|d| d.old_name.chars().count())
        .max()
        .unwrap_or(0);
    for directive in directives {
        println!(
            "  {:<width$} -> {}  {}",
            directive.old_name,
            style(&directive.new_name).bold(),
            style(directive.normalized_path()).dim(),
            width = width
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_line_applied_pluralizes() {
        let directive = RenameDirective::new("x", "count", "/a.py");
        let one = outcome_line(&directive, &RenameOutcome::Applied { replacements: 1 }, false);
        let many = outcome_line(&directive, &RenameOutcome::Applied { replacements: 3 }, false);
        assert!(one.contains("Replaced 'x' -> 'count' in a.py (1 occurrence)"));
        assert!(many.ends_with("(3 occurrences)"));
    }

    #[test]
    fn test_outcome_line_dry_run_wording() {
        let directive = RenameDirective::new("x", "count", "a.py");
        let line = outcome_line(&directive, &RenameOutcome::Applied { replacements: 2 }, true);
        assert!(line.contains("Would replace"));
    }

    #[test]
    fn test_outcome_line_other_outcomes() {
        let directive = RenameDirective::new("x", "count", "a.py");
        assert!(outcome_line(&directive, &RenameOutcome::NoMatch, false)
            .contains("No replacements needed for a.py"));
        assert!(outcome_line(&directive, &RenameOutcome::MissingFile, false)
            .contains("File a.py does not exist"));
        assert!(outcome_line(&directive, &RenameOutcome::RejectedPath, false)
            .contains("Skipped a.py"));
        let failed = RenameOutcome::Failed {
            reason: "read failed: bad utf-8".to_string(),
        };
        assert!(outcome_line(&directive, &failed, false).contains("bad utf-8"));
    }
}
