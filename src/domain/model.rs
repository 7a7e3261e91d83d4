use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Value bound to a `{{placeholder}}` at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    Single(String),
    List(Vec<String>),
}

impl Binding {
    /// Joined form, used when the placeholder sits inside a larger word.
    pub fn joined(&self) -> String {
        match self {
            Binding::Single(value) => value.clone(),
            Binding::List(values) => values.join(" "),
        }
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Binding::Single(value.to_string())
    }
}

pub type Bindings = BTreeMap<String, Binding>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default = "default_required")]
    pub required: bool,
    pub default: Option<String>,
    pub help: Option<String>,
}

fn default_required() -> bool {
    true
}

/// What a `requires_env` entry checks before a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvRequirement {
    /// Set and non-empty.
    Present,
    /// Set and parseable as a database URL.
    Url,
}

/// A program and its arguments, ready to spawn. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl PreparedCommand {
    pub fn new(argv: Vec<String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
            env: BTreeMap::new(),
            working_dir: None,
        })
    }

    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env = env.clone();
        self
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Command line as a POSIX shell would need it typed.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | ',' | '+' | '@' | '%')
        });
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: i32,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: i32,
    pub stdout: String,
}

impl CapturedOutput {
    /// Whitespace-separated words of stdout, e.g. container ids. Repeats are
    /// dropped so an image listed once per tag is only named once.
    pub fn words(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stdout
            .split_whitespace()
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub command: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub task: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub exit_code: i32,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Commands that were actually handed to the executor as steps.
    pub fn executed_commands(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.status != StepStatus::Skipped)
            .map(|s| s.command.as_str())
            .collect()
    }
}
