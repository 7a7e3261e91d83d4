use crate::utils::error::{Result, TaskError};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Database URL schemes accepted by `requires_env` url checks. A driver
/// suffix (`postgresql+asyncpg`) is allowed on any of them.
pub const DATABASE_SCHEMES: &[&str] = &["postgres", "postgresql", "sqlite", "mysql"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("valid identifier regex"))
}

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid variable regex"))
}

pub fn validate_task_name(field_name: &str, name: &str) -> Result<()> {
    if !identifier_regex().is_match(name) {
        return Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Task names must be lowercase letters, digits and dashes, starting with a letter"
                .to_string(),
        });
    }
    Ok(())
}

/// Placeholder, parameter and variable names share one shape.
pub fn validate_variable_name(field_name: &str, name: &str) -> Result<()> {
    if !variable_regex().is_match(name) {
        return Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Names must be letters, digits and underscores, not starting with a digit"
                .to_string(),
        });
    }
    Ok(())
}

pub fn validate_database_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => {
            let base = url.scheme().split('+').next().unwrap_or_default();
            if DATABASE_SCHEMES.contains(&base) {
                Ok(())
            } else {
                Err(TaskError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: format!(
                        "Unsupported URL scheme: {}. Expected one of: {}",
                        url.scheme(),
                        DATABASE_SCHEMES.join(", ")
                    ),
                })
            }
        }
        Err(e) => Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TaskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
