//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `suggest` | `Suggest`        |
//! | `status`  | `Status`         |
//! | `apply`   | `Apply`          |
//! | `replay`  | `Replay`         |
//! | `config`  | `Config`         |

pub mod apply;
pub mod config;
pub mod replay;
pub mod status;
pub mod suggest;

pub use apply::cmd_apply;
pub use config::cmd_config;
pub use replay::cmd_replay;
pub use status::cmd_status;
pub use suggest::{SuggestArgs, cmd_suggest};
