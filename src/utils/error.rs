use thiserror::Error;

/// Exit code for usage and configuration problems caught before anything runs.
pub const EXIT_USAGE: i32 = 2;
/// Exit code when a program exists but cannot be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit code when a program cannot be found on `PATH`.
pub const EXIT_NOT_FOUND: i32 = 127;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid command template `{template}`: {message}")]
    TemplateError { template: String, message: String },

    #[error("Unknown task `{name}`")]
    UnknownTask { name: String, available: Vec<String> },

    #[error("Task `{task}` requires parameter `{param}`")]
    MissingParameter { task: String, param: String },

    #[error("Task `{task}` does not accept parameter `{param}`")]
    UnknownParameter { task: String, param: String },

    #[error("Malformed argument `{arg}`, expected key=value")]
    InvalidArgument { arg: String },

    #[error("Task `{task}` requires environment variable {var}: {reason}")]
    MissingEnvironment {
        task: String,
        var: String,
        reason: String,
    },

    #[error("Failed to start `{program}`: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Usage,
    Environment,
    Execution,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        TaskError::ConfigValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        TaskError::TemplateError {
            template: template.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TaskError::ConfigValidationError { .. }
            | TaskError::InvalidConfigValueError { .. }
            | TaskError::MissingConfigError { .. }
            | TaskError::TemplateError { .. } => ErrorCategory::Configuration,
            TaskError::UnknownTask { .. }
            | TaskError::MissingParameter { .. }
            | TaskError::UnknownParameter { .. }
            | TaskError::InvalidArgument { .. } => ErrorCategory::Usage,
            TaskError::MissingEnvironment { .. } => ErrorCategory::Environment,
            TaskError::SpawnError { .. } => ErrorCategory::Execution,
            TaskError::IoError(_) | TaskError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Usage | ErrorCategory::Environment => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Execution => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for errors raised by the runner itself. A wrapped
    /// tool's own exit code travels in the run report instead.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskError::SpawnError { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                _ => EXIT_NOT_EXECUTABLE,
            },
            _ => match self.category() {
                ErrorCategory::Configuration
                | ErrorCategory::Usage
                | ErrorCategory::Environment => EXIT_USAGE,
                _ => 1,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            TaskError::UnknownTask { available, .. } => {
                format!("Available tasks: {}", available.join(", "))
            }
            TaskError::MissingParameter { task, param } => {
                format!("Run `bake {} {}=<value>`", task, param)
            }
            TaskError::UnknownParameter { task, .. } => {
                format!("Run `bake --list` to see the parameters `{}` accepts", task)
            }
            TaskError::InvalidArgument { .. } => {
                "Pass task parameters as key=value, e.g. `bake create-migrations msg=\"add sales\"`"
                    .to_string()
            }
            TaskError::MissingEnvironment { var, .. } => {
                format!("Export {} or add it to the project's .env file", var)
            }
            TaskError::SpawnError { program, .. } => {
                format!("Make sure `{}` is installed and on PATH", program)
            }
            TaskError::TemplateError { .. } => {
                "Check quoting and {{placeholder}} syntax in the taskfile".to_string()
            }
            TaskError::ConfigValidationError { .. }
            | TaskError::InvalidConfigValueError { .. }
            | TaskError::MissingConfigError { .. } => {
                "Fix the taskfile and run `bake --list` to validate it".to_string()
            }
            TaskError::IoError(_) | TaskError::SerializationError(_) => {
                "Check file permissions and the working directory".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TaskError::SpawnError { program, source } if source.kind() == std::io::ErrorKind::NotFound => {
                format!("Command not found: {}", program)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
