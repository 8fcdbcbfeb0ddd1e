pub mod icons;
pub mod report;
pub mod spinner;

pub use report::{print_directives, print_report};
pub use spinner::PollSpinner;
