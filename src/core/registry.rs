use crate::config::taskfile::{TaskConfig, Taskfile};
use crate::config::DEFAULT_TASKFILE;
use crate::core::plan::{ExecutionPlan, PlannedStep};
use crate::core::template::CommandTemplate;
use crate::domain::model::{Binding, Bindings, EnvRequirement, ParamSpec, PreparedCommand};
use crate::domain::ports::TaskSource;
use crate::utils::error::{Result, TaskError};
use crate::utils::validation::Validate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Builtin placeholder: the directory commands run in.
pub const CWD: &str = "cwd";
/// Builtin placeholder: a guarded step's guard output.
pub const PROBE: &str = "probe";

const RESERVED: &[&str] = &[CWD, PROBE];

#[derive(Debug, Clone)]
pub struct TaskStep {
    pub run: CommandTemplate,
    pub guard: Option<CommandTemplate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<ParamSpec>,
    pub steps: Vec<TaskStep>,
    pub env: BTreeMap<String, CommandTemplate>,
    pub append_paths: BTreeMap<String, Vec<CommandTemplate>>,
    pub requires_env: BTreeMap<String, EnvRequirement>,
    pub destructive: bool,
}

impl Task {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Usage fragment such as `msg=<msg> [service=<service>]`.
    pub fn usage(&self) -> String {
        self.params
            .iter()
            .map(|p| {
                if is_required(p) {
                    format!("{}=<{}>", p.name, p.name)
                } else {
                    format!("[{}=<{}>]", p.name, p.name)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn from_config(name: &str, config: TaskConfig, vars: &Bindings) -> Result<Self> {
        for param in &config.params {
            if RESERVED.contains(&param.name.as_str()) {
                return Err(TaskError::config(
                    format!("tasks.{}.params", name),
                    format!("`{}` is a reserved placeholder name", param.name),
                ));
            }
        }

        let known: BTreeSet<&str> = config
            .params
            .iter()
            .map(|p| p.name.as_str())
            .chain(vars.keys().map(String::as_str))
            .chain(std::iter::once(CWD))
            .collect();

        let check = |field: String, template: &CommandTemplate, allow_probe: bool| -> Result<()> {
            for placeholder in template.placeholders() {
                if !(known.contains(placeholder) || (allow_probe && placeholder == PROBE)) {
                    return Err(TaskError::config(
                        field,
                        format!(
                            "`{{{{{}}}}}` is not a parameter of this task or a variable",
                            placeholder
                        ),
                    ));
                }
            }
            Ok(())
        };

        let mut steps = Vec::with_capacity(config.steps.len());
        for (i, step) in config.steps.into_iter().enumerate() {
            let guard = step
                .when_output
                .as_deref()
                .map(CommandTemplate::parse)
                .transpose()?;
            if let Some(guard) = &guard {
                check(format!("tasks.{}.steps[{}].when_output", name, i), guard, false)?;
            }
            let run = CommandTemplate::parse(&step.run)?;
            check(format!("tasks.{}.steps[{}].run", name, i), &run, guard.is_some())?;
            steps.push(TaskStep {
                run,
                guard,
                description: step.description,
            });
        }

        let mut env = BTreeMap::new();
        for (key, value) in config.env {
            let template = CommandTemplate::parse_value(&value)?;
            check(format!("tasks.{}.env.{}", name, key), &template, false)?;
            env.insert(key, template);
        }

        let mut append_paths = BTreeMap::new();
        for (key, entries) in config.append_paths {
            let mut templates = Vec::with_capacity(entries.len());
            for entry in entries {
                let template = CommandTemplate::parse_value(&entry)?;
                check(format!("tasks.{}.append_paths.{}", name, key), &template, false)?;
                templates.push(template);
            }
            append_paths.insert(key, templates);
        }

        Ok(Self {
            name: name.to_string(),
            description: config.description,
            params: config.params,
            steps,
            env,
            append_paths,
            requires_env: config.requires_env,
            destructive: config.destructive,
        })
    }
}

fn is_required(param: &ParamSpec) -> bool {
    param.required && param.default.is_none()
}

/// The validated task table.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    project: String,
    working_dir: PathBuf,
    env_file: PathBuf,
    vars: Bindings,
    tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
    pub fn load(source: &dyn TaskSource) -> Result<Self> {
        let base_dir = source.base_dir()?;
        let taskfile = match source.read_taskfile()? {
            Some(content) => Taskfile::from_toml_str(&content)?,
            None => Taskfile::from_toml_str(DEFAULT_TASKFILE)?,
        };
        Self::from_taskfile(taskfile, base_dir)
    }

    /// The built-in recipes, rooted at `base_dir`.
    pub fn builtin(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::from_taskfile(Taskfile::from_toml_str(DEFAULT_TASKFILE)?, base_dir.into())
    }

    pub fn from_taskfile(taskfile: Taskfile, base_dir: PathBuf) -> Result<Self> {
        taskfile.validate()?;

        let working_dir = match &taskfile.settings.working_directory {
            Some(dir) => base_dir.join(dir),
            None => base_dir.clone(),
        };
        let env_file = base_dir.join(taskfile.env_file());
        let project = taskfile.project_name().to_string();

        let mut tasks = BTreeMap::new();
        for (name, config) in taskfile.tasks {
            let task = Task::from_config(&name, config, &taskfile.vars)?;
            tasks.insert(name, task);
        }

        tracing::debug!("Loaded {} tasks for {}", tasks.len(), project);

        Ok(Self {
            project,
            working_dir,
            env_file,
            vars: taskfile.vars,
            tasks,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks.get(name).ok_or_else(|| TaskError::UnknownTask {
            name: name.to_string(),
            available: self.task_names(),
        })
    }

    /// Load `settings.env_file` into the process environment. Variables that
    /// are already set win. A missing file is not an error.
    pub fn load_env_file(&self) -> Result<bool> {
        if !self.env_file.is_file() {
            return Ok(false);
        }
        dotenvy::from_path(&self.env_file).map_err(|e| {
            TaskError::config("settings.env_file", format!("{}: {}", self.env_file.display(), e))
        })?;
        tracing::debug!("Loaded environment from {}", self.env_file.display());
        Ok(true)
    }

    /// Bind `key=value` arguments to the task's parameters and render
    /// everything that does not depend on guard output.
    pub fn resolve(&self, name: &str, args: &[String]) -> Result<ExecutionPlan> {
        let task = self.get(name)?;

        let mut provided: BTreeMap<&str, &str> = BTreeMap::new();
        for arg in args {
            let (key, value) = arg
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| TaskError::InvalidArgument { arg: arg.clone() })?;
            if task.param(key).is_none() {
                return Err(TaskError::UnknownParameter {
                    task: task.name.clone(),
                    param: key.to_string(),
                });
            }
            provided.insert(key, value);
        }

        let mut bindings = self.vars.clone();
        bindings.insert(
            CWD.to_string(),
            Binding::Single(self.working_dir.display().to_string()),
        );

        for param in &task.params {
            let value = provided
                .get(param.name.as_str())
                .map(|v| v.to_string())
                .filter(|v| !(is_required(param) && v.trim().is_empty()))
                .or_else(|| param.default.clone());
            let binding = match value {
                Some(value) => Binding::Single(value),
                None if is_required(param) => {
                    return Err(TaskError::MissingParameter {
                        task: task.name.clone(),
                        param: param.name.clone(),
                    })
                }
                // Omitted optional parameters drop out of the command line.
                None => Binding::List(Vec::new()),
            };
            bindings.insert(param.name.clone(), binding);
        }

        let env = self.render_env(task, &bindings)?;

        let mut steps = Vec::with_capacity(task.steps.len());
        for (index, step) in task.steps.iter().enumerate() {
            let guard = match &step.guard {
                Some(template) => Some(
                    PreparedCommand::new(template.render(&bindings)?)
                        .ok_or_else(|| TaskError::template(template.source(), "renders to an empty command"))?
                        .with_env(&env)
                        .with_working_dir(Some(self.working_dir.clone())),
                ),
                None => None,
            };
            steps.push(PlannedStep::new(
                index,
                step.description.clone(),
                guard,
                step.run.clone(),
                bindings.clone(),
                env.clone(),
                self.working_dir.clone(),
            ));
        }

        Ok(ExecutionPlan {
            task: task.name.clone(),
            destructive: task.destructive,
            working_dir: self.working_dir.clone(),
            env,
            requires_env: task.requires_env.clone(),
            steps,
        })
    }

    fn render_env(&self, task: &Task, bindings: &Bindings) -> Result<BTreeMap<String, String>> {
        let mut env = BTreeMap::new();
        for (key, template) in &task.env {
            env.insert(key.clone(), template.render_value(bindings)?);
        }

        for (key, templates) in &task.append_paths {
            let current = env
                .get(key)
                .map(std::ffi::OsString::from)
                .or_else(|| std::env::var_os(key))
                .unwrap_or_default();
            let mut paths: Vec<PathBuf> = std::env::split_paths(&current)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            for template in templates {
                paths.push(PathBuf::from(template.render_value(bindings)?));
            }
            let joined = std::env::join_paths(paths).map_err(|e| {
                TaskError::config(format!("tasks.{}.append_paths.{}", task.name, key), e.to_string())
            })?;
            env.insert(key.clone(), joined.to_string_lossy().into_owned());
        }

        Ok(env)
    }
}
