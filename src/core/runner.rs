use crate::core::plan::{ExecutionPlan, PlannedStep};
use crate::domain::model::{EnvRequirement, RunReport, StepReport, StepStatus};
use crate::domain::ports::CommandExecutor;
use crate::utils::error::{Result, TaskError};
use crate::utils::validation::validate_database_url;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Runs plans step by step. The first failing step ends the task and its
/// exit code becomes the report's exit code.
pub struct TaskRunner<E: CommandExecutor> {
    executor: E,
}

impl<E: CommandExecutor> TaskRunner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Check `requires_env` against the plan's own env and then the process env.
    pub fn preflight(&self, plan: &ExecutionPlan) -> Result<()> {
        check_requirements(plan, |var| std::env::var(var).ok())
    }

    pub async fn run(&self, plan: &ExecutionPlan) -> Result<RunReport> {
        self.preflight(plan)?;

        if plan.destructive {
            tracing::warn!("⚠️ Task `{}` is destructive and cannot be undone", plan.task);
        }
        tracing::info!("🚀 Running task `{}`", plan.task);

        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let clock = Instant::now();

            let probe = match &step.guard {
                Some(guard) => {
                    tracing::debug!("🔍 Guard: {}", guard.display());
                    let output = self.executor.capture(guard).await?;
                    if output.code != 0 {
                        tracing::error!("❌ Guard `{}` exited with code {}", guard.display(), output.code);
                        steps.push(step_report(step, guard.display(), StepStatus::Failed, Some(output.code), &clock));
                        return Ok(finish(plan, started_at, steps, output.code));
                    }
                    let words = output.words();
                    if words.is_empty() {
                        tracing::info!("⏭️ Skipping step {}: `{}` printed nothing", step.index + 1, guard.display());
                        steps.push(step_report(step, step.display(), StepStatus::Skipped, None, &clock));
                        continue;
                    }
                    Some(words)
                }
                None => None,
            };

            let command = step.command(probe)?;
            let line = command.display();
            tracing::info!("▶️ {}", line);

            let outcome = self.executor.run(&command).await?;
            if !outcome.success() {
                tracing::error!("❌ `{}` exited with code {}", line, outcome.code);
                steps.push(step_report(step, line, StepStatus::Failed, Some(outcome.code), &clock));
                return Ok(finish(plan, started_at, steps, outcome.code));
            }
            steps.push(step_report(step, line, StepStatus::Succeeded, Some(outcome.code), &clock));
        }

        tracing::info!("✅ Task `{}` completed", plan.task);
        Ok(finish(plan, started_at, steps, 0))
    }
}

pub fn check_requirements(
    plan: &ExecutionPlan,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    for (var, requirement) in &plan.requires_env {
        let value = plan.env.get(var).cloned().or_else(|| lookup(var));
        let missing = |reason: &str| TaskError::MissingEnvironment {
            task: plan.task.clone(),
            var: var.clone(),
            reason: reason.to_string(),
        };

        match value {
            None => return Err(missing("not set")),
            Some(v) if v.trim().is_empty() => return Err(missing("empty")),
            Some(v) => {
                if *requirement == EnvRequirement::Url {
                    validate_database_url(var, &v).map_err(|e| missing(&e.to_string()))?;
                }
            }
        }
    }
    Ok(())
}

fn step_report(
    step: &PlannedStep,
    command: String,
    status: StepStatus,
    exit_code: Option<i32>,
    clock: &Instant,
) -> StepReport {
    StepReport {
        index: step.index,
        command,
        status,
        exit_code,
        duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

fn finish(plan: &ExecutionPlan, started_at: DateTime<Utc>, steps: Vec<StepReport>, exit_code: i32) -> RunReport {
    RunReport {
        task: plan.task.clone(),
        started_at,
        finished_at: Utc::now(),
        steps,
        exit_code,
    }
}
