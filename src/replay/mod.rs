//! Standalone replay programs.
//!
//! A replay program is a single std-only Rust file that applies one fixed
//! directive list, so a rename batch can be re-run later without namefix or
//! the analysis service. Its matching code is the engine's kernel source
//! (`rename/lexical.rs`) embedded verbatim, which keeps the replay and the
//! engine on the same algorithm.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

use crate::directives::RenamePlan;

const KERNEL_SOURCE: &str = include_str!("../rename/lexical.rs");

const MAIN_SOURCE: &str = r#"
fn main() {
    let allow_outside_root = std::env::args().skip(1).any(|arg| arg == "--allow-outside-root");
    let dry_run = std::env::args().skip(1).any(|arg| arg == "--dry-run");
    let options = lexical::KernelOptions {
        write: !dry_run,
        allow_outside_root,
    };
    let root = std::path::Path::new(".");
    let mut failed = false;

    for &(old_name, new_name, file_path) in DIRECTIVES {
        match lexical::rename_in_file(root, old_name, new_name, file_path, options) {
            lexical::Step::Rewritten { replacements } => println!(
                "Replaced '{}' with '{}' in {} ({} occurrence{}).",
                old_name,
                new_name,
                file_path,
                replacements,
                if replacements == 1 { "" } else { "s" }
            ),
            lexical::Step::Unchanged => println!("No replacements needed for {}.", file_path),
            lexical::Step::Missing => println!("File {} does not exist.", file_path),
            lexical::Step::OutsideRoot => {
                println!("Skipped {}: path leaves the working directory.", file_path)
            }
            lexical::Step::Failed(reason) => {
                failed = true;
                eprintln!("Failed on {}: {}", file_path, reason);
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
"#;

/// Render the replay program for `plan`.
pub fn render(plan: &RenamePlan) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "// Generated by namefix {} on {}.",
        env!("CARGO_PKG_VERSION"),
        plan.generated_at.to_rfc3339()
    );
    if let Some(source) = &plan.source {
        let _ = writeln!(out, "// Directives suggested for {}.", source);
    }
    out.push_str("//\n");
    out.push_str("// Build and run from the repository root:\n");
    out.push_str("//     rustc --edition 2021 -O replace.rs && ./replace\n");
    out.push_str("// Flags: --dry-run, --allow-outside-root\n\n");

    out.push_str("#[allow(dead_code)]\nmod lexical {\n");
    out.push_str(KERNEL_SOURCE);
    out.push_str("}\n\n");

    out.push_str("const DIRECTIVES: &[(&str, &str, &str)] = &[\n");
    for directive in &plan.directives {
        let _ = writeln!(
            out,
            "    ({:?}, {:?}, {:?}),",
            directive.old_name, directive.new_name, directive.file_path
        );
    }
    out.push_str("];\n");
    out.push_str(MAIN_SOURCE);
    out
}

/// Render and write the replay program for `plan` to `path`.
pub fn write(plan: &RenamePlan, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, render(plan))
        .with_context(|| format!("Failed to write replay program: {}", path.display()))
}
