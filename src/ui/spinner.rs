use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::remote::JobStatus;
use crate::ui::icons::{CHECK, CLOCK, CROSS};

/// Spinner shown while waiting on a remote indexing job.
pub struct PollSpinner {
    bar: ProgressBar,
}

impl PollSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_prefix(CLOCK.to_string());
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Hidden spinner for non-interactive runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, attempt: u32, status: &JobStatus) {
        self.bar
            .set_message(format!("Indexing: {} (check {})", status, attempt));
    }

    pub fn finish_ok(&self, message: impl Into<String>) {
        self.bar
            .finish_with_message(format!("{}{}", CHECK, style(message.into()).green()));
    }

    pub fn finish_err(&self, message: impl Into<String>) {
        self.bar
            .abandon_with_message(format!("{}{}", CROSS, style(message.into()).red()));
    }
}
