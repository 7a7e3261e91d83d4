use crate::domain::model::{CapturedOutput, ExitOutcome, PreparedCommand};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Runs external commands. The process executor is the real one; tests
/// script their own.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run with inherited stdio and wait for exit.
    async fn run(&self, command: &PreparedCommand) -> Result<ExitOutcome>;

    /// Run with stdout captured, for step guards.
    async fn capture(&self, command: &PreparedCommand) -> Result<CapturedOutput>;
}

/// Where the task table comes from.
pub trait TaskSource: Send + Sync {
    /// Taskfile contents, or `None` to use the built-in recipes.
    fn read_taskfile(&self) -> Result<Option<String>>;

    /// Directory commands run in and `{{cwd}}` expands to.
    fn base_dir(&self) -> Result<PathBuf>;
}
