//! `namefix apply`: run the rename engine over a saved plan.

use anyhow::{Context, Result};
use std::path::Path;

use namefix::config::NamefixConfig;
use namefix::directives::RenamePlan;
use namefix::rename::{EngineOptions, RenameEngine};
use namefix::ui;

pub fn cmd_apply(
    project_dir: &Path,
    plan: Option<&Path>,
    dry_run: bool,
    json: bool,
    allow_outside_root: bool,
) -> Result<()> {
    let config = NamefixConfig::load(project_dir)?;
    let plan_path = plan
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.plan_file.clone());

    if !plan_path.exists() {
        anyhow::bail!(
            "No plan found at {}. Run 'namefix suggest' first.",
            plan_path.display()
        );
    }
    let plan = RenamePlan::load(&plan_path)?;

    let engine = RenameEngine::new(project_dir).with_options(EngineOptions {
        dry_run,
        allow_outside_root: allow_outside_root || config.allow_outside_root,
    });
    let report = engine.run(&plan.directives);

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", rendered);
    } else {
        ui::print_report(&report);
    }

    if report.has_failures() {
        anyhow::bail!("Some directives could not be applied");
    }
    Ok(())
}
