//! CLI dispatch: list tasks, print a dry-run plan, or run a task.

pub mod output;

use crate::adapters::ProcessExecutor;
use crate::config::cli::LocalTaskSource;
use crate::config::CliConfig;
use crate::core::registry::TaskRegistry;
use crate::core::runner::TaskRunner;
use crate::utils::error::Result;

/// Returns the process exit code for a finished invocation.
pub async fn execute(config: &CliConfig) -> Result<i32> {
    let source = LocalTaskSource::from_current_dir(config.taskfile.clone())?;
    let registry = TaskRegistry::load(&source)?;
    registry.load_env_file()?;

    let mut stdout = std::io::stdout();

    let task = match config.task.as_deref() {
        Some(task) if !config.list => task,
        _ => {
            output::write_task_list(&mut stdout, &registry, config.json)?;
            return Ok(0);
        }
    };

    let plan = registry.resolve(task, &config.params)?;

    if config.dry_run {
        tracing::info!("🔍 DRY RUN - nothing will be executed");
        output::write_plan(&mut stdout, &plan, config.json)?;
        return Ok(0);
    }

    if config.monitor {
        tracing::info!("🔍 Process monitoring enabled");
    }
    let runner = TaskRunner::new(ProcessExecutor::new().with_monitoring(config.monitor));
    let report = runner.run(&plan).await?;

    if config.json {
        output::write_report(&mut stdout, &report)?;
    }

    Ok(report.exit_code)
}
