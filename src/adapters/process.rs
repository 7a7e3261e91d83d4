use crate::domain::model::{CapturedOutput, ExitOutcome, PreparedCommand};
use crate::domain::ports::CommandExecutor;
use crate::utils::error::{Result, TaskError};
use crate::utils::monitor::ProcessMonitor;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Spawns real child processes with tokio.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    monitor: bool,
    sample_interval: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self {
            monitor: false,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled;
        self
    }

    fn command(prepared: &PreparedCommand) -> Command {
        let mut command = Command::new(&prepared.program);
        command.args(&prepared.args).envs(&prepared.env);
        if let Some(dir) = &prepared.working_dir {
            command.current_dir(dir);
        }
        command
    }

    fn spawn_error(prepared: &PreparedCommand, source: std::io::Error) -> TaskError {
        TaskError::SpawnError {
            program: prepared.program.clone(),
            source,
        }
    }
}

/// Exit code as a shell reports it: the tool's own code, or 128 + signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, prepared: &PreparedCommand) -> Result<ExitOutcome> {
        let mut child = Self::command(prepared)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Self::spawn_error(prepared, e))?;

        let status = match child.id().filter(|_| self.monitor) {
            Some(pid) => {
                let mut monitor = ProcessMonitor::new(pid, prepared.display());
                let mut ticker = tokio::time::interval(self.sample_interval);
                let status = loop {
                    tokio::select! {
                        status = child.wait() => break status?,
                        _ = ticker.tick() => {
                            monitor.sample();
                        }
                    }
                };
                monitor.log_final_stats();
                status
            }
            None => child.wait().await?,
        };

        Ok(ExitOutcome {
            code: exit_code(status),
        })
    }

    async fn capture(&self, prepared: &PreparedCommand) -> Result<CapturedOutput> {
        let output = Self::command(prepared)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| Self::spawn_error(prepared, e))?;

        Ok(CapturedOutput {
            code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
