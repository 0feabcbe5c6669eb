//! Subcommand implementations.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

pub mod publish;
pub mod services;
pub mod status;
pub mod token;
pub mod tunnel;
pub mod watch;

use std::path::PathBuf;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Global {
    /// Directory holding `.fedmesh/settings.json` and the compose project.
    pub project_dir: PathBuf,
    pub non_interactive: bool,
}
