use crate::core::plan::ExecutionPlan;
use crate::core::registry::{Task, TaskRegistry};
use crate::domain::model::{ParamSpec, RunReport};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct TaskSummary<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub params: &'a [ParamSpec],
    pub destructive: bool,
    pub steps: Vec<&'a str>,
}

impl<'a> From<&'a Task> for TaskSummary<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            name: &task.name,
            description: task.description.as_deref(),
            params: &task.params,
            destructive: task.destructive,
            steps: task.steps.iter().map(|s| s.run.source()).collect(),
        }
    }
}

pub fn write_task_list(out: &mut impl Write, registry: &TaskRegistry, json: bool) -> Result<()> {
    if json {
        let summaries: Vec<TaskSummary> = registry.tasks().map(TaskSummary::from).collect();
        serde_json::to_writer_pretty(&mut *out, &summaries)?;
        writeln!(out)?;
        return Ok(());
    }

    let heads: Vec<(String, &Task)> = registry
        .tasks()
        .map(|task| {
            let usage = task.usage();
            let head = if usage.is_empty() {
                task.name.clone()
            } else {
                format!("{} {}", task.name, usage)
            };
            (head, task)
        })
        .collect();
    let width = heads.iter().map(|(head, _)| head.len()).max().unwrap_or(0);

    writeln!(out, "Tasks for {}:", registry.project())?;
    for (head, task) in heads {
        let mut line = format!("  {:<width$}  {}", head, task.description.as_deref().unwrap_or(""), width = width);
        if task.destructive {
            line.push_str(" [destructive]");
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Dry-run output: environment as `#` comments, then one command per line.
pub fn write_plan(out: &mut impl Write, plan: &ExecutionPlan, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, &plan.summary())?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "# task: {} (in {})", plan.task, plan.working_dir.display())?;
    for (key, value) in &plan.env {
        writeln!(out, "# env: {}={}", key, value)?;
    }
    for step in &plan.steps {
        if let Some(guard) = &step.guard {
            writeln!(out, "# only if `{}` prints something", guard.display())?;
        }
        writeln!(out, "{}", step.display())?;
    }
    Ok(())
}

pub fn write_report(out: &mut impl Write, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_list_text() {
        let registry = TaskRegistry::builtin("/srv/bakery").unwrap();
        let mut out = Vec::new();
        write_task_list(&mut out, &registry, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Tasks for bakery-api:"));
        assert!(text.contains("create-migrations msg=<msg>"));
        assert!(text.contains("rollback-migrations id=<id>"));
        assert!(text.lines().any(|l| l.contains("kabum") && l.ends_with("[destructive]")));
    }

    #[test]
    fn test_task_list_json() {
        let registry = TaskRegistry::builtin("/srv/bakery").unwrap();
        let mut out = Vec::new();
        write_task_list(&mut out, &registry, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        let tasks = value.as_array().unwrap();
        assert_eq!(tasks.len(), 10);
        let stop = tasks.iter().find(|t| t["name"] == "stop").unwrap();
        assert_eq!(stop["steps"][0], "docker compose down");
        assert_eq!(stop["destructive"], false);
    }

    #[test]
    fn test_plan_text() {
        let registry = TaskRegistry::builtin("/srv/bakery").unwrap();
        let plan = registry
            .resolve("create-migrations", &["msg=add sales".to_string()])
            .unwrap();
        let mut out = Vec::new();
        write_plan(&mut out, &plan, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("# env: PYTHONPATH="));
        assert!(text.lines().any(|l| l == "alembic revision --autogenerate -m 'add sales'"));
    }
}
