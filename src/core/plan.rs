use crate::core::template::CommandTemplate;
use crate::core::registry::PROBE;
use crate::domain::model::{Binding, Bindings, EnvRequirement, PreparedCommand};
use crate::utils::error::{Result, TaskError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A task invocation with every parameter bound, ready for the runner.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub task: String,
    pub destructive: bool,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub requires_env: BTreeMap<String, EnvRequirement>,
    pub steps: Vec<PlannedStep>,
}

#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub index: usize,
    pub description: Option<String>,
    pub guard: Option<PreparedCommand>,
    template: CommandTemplate,
    bindings: Bindings,
    env: BTreeMap<String, String>,
    working_dir: PathBuf,
}

impl PlannedStep {
    pub(crate) fn new(
        index: usize,
        description: Option<String>,
        guard: Option<PreparedCommand>,
        template: CommandTemplate,
        bindings: Bindings,
        env: BTreeMap<String, String>,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            index,
            description,
            guard,
            template,
            bindings,
            env,
            working_dir,
        }
    }

    /// Render the step's command. `probe` is the guard's output for guarded steps.
    pub fn command(&self, probe: Option<Vec<String>>) -> Result<PreparedCommand> {
        let argv = match probe {
            Some(words) => {
                let mut bindings = self.bindings.clone();
                bindings.insert(PROBE.to_string(), Binding::List(words));
                self.template.render(&bindings)?
            }
            None => self.template.render(&self.bindings)?,
        };

        PreparedCommand::new(argv)
            .map(|cmd| {
                cmd.with_env(&self.env)
                    .with_working_dir(Some(self.working_dir.clone()))
            })
            .ok_or_else(|| TaskError::template(self.template.source(), "renders to an empty command"))
    }

    /// Command line for dry runs; a guard's output shows as `$(guard)`.
    pub fn display(&self) -> String {
        let guard = self.guard.as_ref().map(PreparedCommand::display);
        self.template.render_display(&self.bindings, |name| match (&guard, name) {
            (Some(guard), PROBE) => format!("$({})", guard),
            _ => format!("{{{{{}}}}}", name),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub index: usize,
    pub description: Option<String>,
    pub guard: Option<String>,
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub task: String,
    pub destructive: bool,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub steps: Vec<StepSummary>,
}

impl ExecutionPlan {
    /// One display line per step, in order.
    pub fn commands(&self) -> Vec<String> {
        self.steps.iter().map(PlannedStep::display).collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            task: self.task.clone(),
            destructive: self.destructive,
            working_dir: self.working_dir.clone(),
            env: self.env.clone(),
            steps: self
                .steps
                .iter()
                .map(|step| StepSummary {
                    index: step.index,
                    description: step.description.clone(),
                    guard: step.guard.as_ref().map(PreparedCommand::display),
                    command: step.display(),
                })
                .collect(),
        }
    }
}
