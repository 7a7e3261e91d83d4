use crate::domain::model::{Binding, EnvRequirement, ParamSpec};
use crate::utils::error::{Result, TaskError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_task_name, validate_variable_name, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taskfile {
    pub project: Option<ProjectInfo>,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub vars: BTreeMap<String, Binding>,
    pub tasks: BTreeMap<String, TaskConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    pub env_file: Option<String>,
    pub working_directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    pub steps: Vec<StepConfig>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Entries appended to a path-list variable such as `PYTHONPATH`.
    #[serde(default)]
    pub append_paths: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub requires_env: BTreeMap<String, EnvRequirement>,
    #[serde(default)]
    pub destructive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub run: String,
    /// Guard command; the step is skipped when it prints nothing.
    pub when_output: Option<String>,
    pub description: Option<String>,
}

impl Taskfile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TaskError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| TaskError::config("taskfile", format!("TOML parsing error: {}", e)))
    }

    /// Replace `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn project_name(&self) -> &str {
        self.project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("tasks")
    }

    pub fn env_file(&self) -> &str {
        self.settings.env_file.as_deref().unwrap_or(DEFAULT_ENV_FILE)
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(TaskError::MissingConfigError {
                field: "tasks".to_string(),
            });
        }

        if let Some(env_file) = &self.settings.env_file {
            validate_path("settings.env_file", env_file)?;
        }
        if let Some(dir) = &self.settings.working_directory {
            validate_path("settings.working_directory", dir)?;
        }

        for name in self.vars.keys() {
            validate_variable_name("vars", name)?;
        }

        for (name, task) in &self.tasks {
            validate_task_name("tasks", name)?;
            task.validate_for(name)?;
        }

        Ok(())
    }
}

impl TaskConfig {
    fn validate_for(&self, name: &str) -> Result<()> {
        if self.steps.is_empty() {
            return Err(TaskError::MissingConfigError {
                field: format!("tasks.{}.steps", name),
            });
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            validate_variable_name(&format!("tasks.{}.params", name), &param.name)?;
            if !seen.insert(param.name.as_str()) {
                return Err(TaskError::config(
                    format!("tasks.{}.params", name),
                    format!("parameter `{}` is declared twice", param.name),
                ));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            validate_non_empty_string(&format!("tasks.{}.steps[{}].run", name, i), &step.run)?;
            if let Some(guard) = &step.when_output {
                validate_non_empty_string(
                    &format!("tasks.{}.steps[{}].when_output", name, i),
                    guard,
                )?;
            }
        }

        for var in self
            .env
            .keys()
            .chain(self.append_paths.keys())
            .chain(self.requires_env.keys())
        {
            validate_variable_name(&format!("tasks.{}", name), var)?;
        }

        Ok(())
    }
}

impl Validate for Taskfile {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
