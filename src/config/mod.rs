pub mod cli;
pub mod taskfile;

#[cfg(feature = "cli")]
use clap::Parser;
use std::path::PathBuf;

/// Recipes used when the project has no `tasks.toml`.
pub const DEFAULT_TASKFILE: &str = include_str!("default_tasks.toml");

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "bake", version))]
#[cfg_attr(
    feature = "cli",
    command(about = "Run the bakery API's lint, migration, container and test recipes")
)]
pub struct CliConfig {
    /// Task to run; lists the tasks when omitted
    pub task: Option<String>,

    /// Task parameters, e.g. msg="add sales table"
    #[cfg_attr(feature = "cli", arg(value_name = "KEY=VALUE"))]
    pub params: Vec<String>,

    /// Taskfile to load instead of ./tasks.toml
    #[cfg_attr(feature = "cli", arg(short, long, env = "BAKE_TASKFILE"))]
    pub taskfile: Option<PathBuf>,

    /// List tasks and exit
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub list: bool,

    /// Print the commands without running anything
    #[cfg_attr(feature = "cli", arg(long))]
    pub dry_run: bool,

    /// Machine-readable output for listings, plans and run reports
    #[cfg_attr(feature = "cli", arg(long))]
    pub json: bool,

    /// Log CPU and memory of each command while it runs
    #[cfg_attr(feature = "cli", arg(long))]
    pub monitor: bool,

    /// Enable verbose output
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[cfg_attr(feature = "cli", arg(long))]
    pub log_json: bool,
}
