#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use async_trait::async_trait;
use bakery_tasks::domain::model::{CapturedOutput, ExitOutcome, PreparedCommand};
use bakery_tasks::domain::ports::CommandExecutor;
use bakery_tasks::{Result, TaskRegistry};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

pub const PROJECT_DIR: &str = "/srv/bakery";

/// Guard of the first `kabum` step.
pub const LIST_STOPPED_CONTAINERS: &str =
    "docker ps -aq --filter status=exited --filter status=created --filter status=dead";

pub fn builtin() -> TaskRegistry {
    TaskRegistry::builtin(PROJECT_DIR).expect("built-in recipes are valid")
}

pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// In-memory executor. Commands are matched by their display form; anything
/// not scripted exits 0 and prints nothing, like an empty docker host.
#[derive(Default)]
pub struct ScriptedExecutor {
    exit_codes: HashMap<String, i32>,
    outputs: HashMap<String, String>,
    ran: Mutex<Vec<PreparedCommand>>,
    captured: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exits(mut self, command: &str, code: i32) -> Self {
        self.exit_codes.insert(command.to_string(), code);
        self
    }

    pub fn prints(mut self, command: &str, stdout: &str) -> Self {
        self.outputs.insert(command.to_string(), stdout.to_string());
        self
    }

    pub fn ran(&self) -> Vec<String> {
        self.ran.lock().unwrap().iter().map(PreparedCommand::display).collect()
    }

    pub fn ran_commands(&self) -> Vec<PreparedCommand> {
        self.ran.lock().unwrap().clone()
    }

    pub fn captured(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, command: &PreparedCommand) -> Result<ExitOutcome> {
        let code = self.exit_codes.get(&command.display()).copied().unwrap_or(0);
        self.ran.lock().unwrap().push(command.clone());
        Ok(ExitOutcome { code })
    }

    async fn capture(&self, command: &PreparedCommand) -> Result<CapturedOutput> {
        let line = command.display();
        self.captured.lock().unwrap().push(line.clone());
        Ok(CapturedOutput {
            code: self.exit_codes.get(&line).copied().unwrap_or(0),
            stdout: self.outputs.get(&line).cloned().unwrap_or_default(),
        })
    }
}

/// An isolated project directory for running the `bake` binary.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn with_taskfile(content: &str) -> Self {
        let project = Self::empty();
        project.write("tasks.toml", content);
        project
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.dir.path().join(name), content).expect("write project file");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bake(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("bake");
        cmd.current_dir(self.dir.path())
            .env_remove("BAKE_TASKFILE")
            .env_remove("RUST_LOG");
        cmd
    }
}
