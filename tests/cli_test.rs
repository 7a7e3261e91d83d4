mod common;

use common::Project;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;

#[test]
fn list_builtin_tasks() {
    let project = Project::empty();
    project
        .bake()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains("Tasks for bakery-api:"))
        .stdout(contains("create-migrations msg=<msg>"))
        .stdout(contains("kabum"));
}

#[test]
fn no_task_lists_tasks() {
    let project = Project::empty();
    project
        .bake()
        .assert()
        .success()
        .stdout(contains("rollback-migrations id=<id>"));
}

#[test]
fn dry_run_prints_documented_command() {
    let project = Project::empty();
    project
        .bake()
        .args(["--dry-run", "create-migrations", "msg=add sales table"])
        .assert()
        .success()
        .stdout(contains("alembic revision --autogenerate -m 'add sales table'"));
}

#[test]
fn dry_run_json_plan() {
    let project = Project::empty();
    let out = project
        .bake()
        .args(["--dry-run", "--json", "stop"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let plan: Value = serde_json::from_slice(&out).expect("valid json output");
    assert_eq!(plan["task"], "stop");
    assert_eq!(plan["steps"][0]["command"], "docker compose down");
}

#[test]
fn dry_run_kabum_shows_guards() {
    let project = Project::empty();
    project
        .bake()
        .args(["--dry-run", "kabum"])
        .assert()
        .success()
        .stdout(contains("docker rm $(docker ps -aq --filter status=exited --filter status=created --filter status=dead)"))
        .stdout(contains("# only if `docker volume ls -q` prints something"));
}

#[test]
fn create_migrations_without_msg_fails() {
    let project = Project::empty();
    project
        .bake()
        .arg("create-migrations")
        .assert()
        .code(2)
        .stderr(contains("msg"));
}

#[test]
fn rollback_migrations_without_id_fails() {
    let project = Project::empty();
    project
        .bake()
        .arg("rollback-migrations")
        .assert()
        .code(2)
        .stderr(contains("id"));
}

#[test]
fn unknown_task_fails() {
    let project = Project::empty();
    project
        .bake()
        .arg("bake-bread")
        .assert()
        .code(2)
        .stderr(contains("Unknown task"));
}

#[test]
fn malformed_argument_fails() {
    let project = Project::empty();
    project
        .bake()
        .args(["rollback-migrations", "base"])
        .assert()
        .code(2)
        .stderr(contains("key=value"));
}

#[test]
fn migrations_need_database_url() {
    let project = Project::empty();
    project
        .bake()
        .env_remove("DB_URL")
        .arg("run-migrations")
        .assert()
        .code(2)
        .stderr(contains("DB_URL"));
}

#[test]
fn invalid_taskfile_is_reported() {
    let project = Project::with_taskfile(
        r#"
[tasks.broken]
steps = [{ run = "alembic downgrade {{id}}" }]
"#,
    );
    project
        .bake()
        .arg("--list")
        .assert()
        .code(2)
        .stderr(contains("{{id}}"));
}

#[test]
fn explicit_taskfile_flag() {
    let project = Project::empty();
    project.write(
        "ops.toml",
        r#"
[project]
name = "ops"

[tasks.hello]
description = "Say hello"
steps = [{ run = "echo hello" }]
"#,
    );
    project
        .bake()
        .args(["--taskfile", "ops.toml", "--list"])
        .assert()
        .success()
        .stdout(contains("Tasks for ops:"))
        .stdout(contains("hello").and(contains("Say hello")));
}

#[cfg(unix)]
mod unix {
    use super::*;

    #[test]
    fn exit_code_is_propagated_verbatim() {
        let project = Project::with_taskfile(
            r#"
[tasks.fail]
steps = [{ run = "sh -c 'exit 7'" }, { run = "touch should-not-exist" }]
"#,
        );
        project.bake().arg("fail").assert().code(7);
        assert!(!project.path().join("should-not-exist").exists());
    }

    #[test]
    fn stop_twice_succeeds() {
        let project = Project::with_taskfile(
            r#"
[tasks.stop]
steps = [{ run = "true" }]
"#,
        );
        project.bake().arg("stop").assert().success();
        project.bake().arg("stop").assert().success();
    }

    #[test]
    fn parameter_with_spaces_is_one_argument() {
        let project = Project::with_taskfile(
            r#"
[tasks.note]
params = [{ name = "msg" }]
steps = [{ run = "sh -c 'printf \"%s|\" \"$@\"' sh {{msg}}" }]
"#,
        );
        project
            .bake()
            .args(["note", "msg=add sales table"])
            .assert()
            .success()
            .stdout("add sales table|");
    }

    #[test]
    fn env_file_is_loaded() {
        let project = Project::with_taskfile(
            r#"
[tasks.check]
requires_env = { BAKE_FROM_DOTENV = "present" }
steps = [{ run = "sh -c 'test \"$BAKE_FROM_DOTENV\" = baked'" }]
"#,
        );
        project.write(".env", "BAKE_FROM_DOTENV=baked\n");
        project
            .bake()
            .env_remove("BAKE_FROM_DOTENV")
            .arg("check")
            .assert()
            .success();
    }

    #[test]
    fn guard_without_output_skips_step() {
        let project = Project::with_taskfile(
            r#"
[tasks.clean]
steps = [{ run = "sh -c 'exit 9' {{probe}}", when_output = "true" }]
"#,
        );
        project.bake().arg("clean").assert().success();
    }

    #[test]
    fn json_run_report() {
        let project = Project::with_taskfile(
            r#"
[tasks.quiet]
steps = [{ run = "true" }]
"#,
        );
        let out = project
            .bake()
            .args(["--json", "quiet"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let report: Value = serde_json::from_slice(&out).expect("valid json output");
        assert_eq!(report["exit_code"], 0);
        assert_eq!(report["steps"][0]["status"], "succeeded");
    }

    #[test]
    fn missing_program_exits_127() {
        let project = Project::with_taskfile(
            r#"
[tasks.ghost]
steps = [{ run = "bake-definitely-not-a-real-program" }]
"#,
        );
        project.bake().arg("ghost").assert().code(127);
    }
}
