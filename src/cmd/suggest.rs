//! `namefix suggest`: index a repository and turn the analysis answer into a plan.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use namefix::config::NamefixConfig;
use namefix::directives::{self, RenamePlan, SUGGESTION_PROMPT};
use namefix::orchestrator::JobOrchestrator;
use namefix::prompt::resolve_target;
use namefix::remote::{GreptileClient, Remote};
use namefix::rename::{EngineOptions, RenameEngine};
use namefix::replay;
use namefix::ui::{self, PollSpinner, icons::SEARCH};

pub struct SuggestArgs {
    pub remote: Option<Remote>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub apply: bool,
    pub dry_run: bool,
    pub interactive: bool,
}

pub async fn cmd_suggest(project_dir: &Path, args: SuggestArgs) -> Result<()> {
    let config = NamefixConfig::load(project_dir)?;
    let credentials = config.credentials()?;
    let target = resolve_target(args.remote, args.repository, args.branch, args.interactive)?;

    let client = GreptileClient::new(&config.base_url, credentials)?;
    let orchestrator =
        JobOrchestrator::new(client, config.poll).with_session_id(config.session_id.clone());

    println!();
    println!(
        "{}Submitting {} ({}, branch {}) for indexing...",
        SEARCH,
        style(&target.repository).bold(),
        target.remote,
        target.branch
    );

    let (handle, raw) = tokio::select! {
        result = async {
            let handle = orchestrator
                .submit(target.remote, &target.repository, &target.branch)
                .await?;

            let spinner = if args.interactive {
                PollSpinner::new("Waiting for indexing")
            } else {
                PollSpinner::hidden()
            };
            let waited = orchestrator
                .await_completion_with(&handle, |attempt, status| spinner.update(attempt, status))
                .await;
            match &waited {
                Ok(summary) => spinner.finish_ok(format!(
                    "Indexed after {} check{}",
                    summary.attempts,
                    if summary.attempts == 1 { "" } else { "s" }
                )),
                Err(e) => spinner.finish_err(e.to_string()),
            }
            waited?;

            let raw = orchestrator.query(&handle, SUGGESTION_PROMPT).await?;
            anyhow::Ok((handle, raw))
        } => result?,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("Interrupted while waiting for the analysis service");
        }
    };

    let directives = directives::parse_response(&raw)
        .context("The analysis service returned no usable directive list")?;
    let plan = RenamePlan::new(directives, Some(handle.to_string()));

    plan.save(&config.plan_file)?;
    replay::write(&plan, &config.replay_file)?;

    println!();
    println!(
        "{} rename suggestion{}:",
        style(plan.directives.len()).bold(),
        if plan.directives.len() == 1 { "" } else { "s" }
    );
    ui::print_directives(&plan.directives);
    println!();
    println!("Plan saved to {}", config.plan_file.display());
    println!("Replay program written to {}", config.replay_file.display());

    if !args.apply {
        println!();
        println!("Run 'namefix apply' to rename, or compile the replay program.");
        return Ok(());
    }

    let engine = RenameEngine::new(project_dir).with_options(EngineOptions {
        dry_run: args.dry_run,
        allow_outside_root: config.allow_outside_root,
    });
    let report = engine.run(&plan.directives);
    ui::print_report(&report);
    if report.has_failures() {
        anyhow::bail!("Some directives could not be applied");
    }
    Ok(())
}
