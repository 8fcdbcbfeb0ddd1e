pub mod config;
pub mod directives;
pub mod errors;
pub mod orchestrator;
pub mod prompt;
pub mod remote;
pub mod rename;
pub mod replay;
pub mod ui;
