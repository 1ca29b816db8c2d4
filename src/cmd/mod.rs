//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled    |
//! |----------|---------------------|
//! | `watch`  | `Deploy`, `Issue`   |
//! | `stages` | `Stages`            |

pub mod stages;
pub mod watch;

pub use stages::cmd_stages;
pub use watch::{cmd_deploy, cmd_issue};
