pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::ProcessExecutor;
pub use config::{cli::LocalTaskSource, taskfile::Taskfile, CliConfig};
pub use core::{plan::ExecutionPlan, registry::TaskRegistry, runner::TaskRunner};
pub use utils::error::{Result, TaskError};
