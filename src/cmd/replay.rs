//! `namefix replay`: regenerate the standalone replay program from a plan.

use anyhow::Result;
use std::path::Path;

use namefix::config::NamefixConfig;
use namefix::directives::RenamePlan;
use namefix::replay;

pub fn cmd_replay(project_dir: &Path, plan: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = NamefixConfig::load(project_dir)?;
    let plan_path = plan
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.plan_file.clone());
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.replay_file.clone());

    if !plan_path.exists() {
        anyhow::bail!(
            "No plan found at {}. Run 'namefix suggest' first.",
            plan_path.display()
        );
    }
    let plan = RenamePlan::load(&plan_path)?;
    replay::write(&plan, &output)?;

    println!(
        "Wrote replay program for {} directive{} to {}",
        plan.directives.len(),
        if plan.directives.len() == 1 { "" } else { "s" },
        output.display()
    );
    println!("Build it with: rustc --edition 2021 -O {}", output.display());
    Ok(())
}
