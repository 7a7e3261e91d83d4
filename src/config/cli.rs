use crate::core::TaskSource;
use crate::utils::error::{Result, TaskError};
use std::path::{Path, PathBuf};

pub const TASKFILE_NAME: &str = "tasks.toml";

/// Finds the taskfile on the local filesystem: an explicit path, else
/// `tasks.toml` in the search directory, else the built-in recipes.
#[derive(Debug, Clone)]
pub struct LocalTaskSource {
    explicit: Option<PathBuf>,
    search_dir: PathBuf,
}

impl LocalTaskSource {
    pub fn new(explicit: Option<PathBuf>, search_dir: PathBuf) -> Self {
        let explicit = explicit.map(|path| {
            if path.is_absolute() {
                path
            } else {
                search_dir.join(path)
            }
        });
        Self {
            explicit,
            search_dir,
        }
    }

    pub fn from_current_dir(explicit: Option<PathBuf>) -> Result<Self> {
        Ok(Self::new(explicit, std::env::current_dir()?))
    }

    /// Resolved taskfile path, `None` when the built-in recipes apply.
    pub fn taskfile_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }
        let candidate = self.search_dir.join(TASKFILE_NAME);
        candidate.is_file().then_some(candidate)
    }
}

impl TaskSource for LocalTaskSource {
    fn read_taskfile(&self) -> Result<Option<String>> {
        let Some(path) = self.taskfile_path() else {
            tracing::debug!("No {} found, using built-in recipes", TASKFILE_NAME);
            return Ok(None);
        };

        if !path.is_file() {
            return Err(TaskError::InvalidConfigValueError {
                field: "taskfile".to_string(),
                value: path.display().to_string(),
                reason: "File does not exist".to_string(),
            });
        }

        tracing::debug!("📁 Loading taskfile from: {}", path.display());
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn base_dir(&self) -> Result<PathBuf> {
        let dir = self
            .taskfile_path()
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.search_dir.clone());
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_falls_back_to_builtin_recipes() {
        let dir = TempDir::new().unwrap();
        let source = LocalTaskSource::new(None, dir.path().to_path_buf());
        assert!(source.read_taskfile().unwrap().is_none());
        assert_eq!(source.base_dir().unwrap(), dir.path());
    }

    #[test]
    fn test_discovers_tasks_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(TASKFILE_NAME), "[tasks]\n").unwrap();
        let source = LocalTaskSource::new(None, dir.path().to_path_buf());
        assert_eq!(source.read_taskfile().unwrap().as_deref(), Some("[tasks]\n"));
    }

    #[test]
    fn test_explicit_path_is_relative_to_search_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("ops")).unwrap();
        std::fs::write(dir.path().join("ops/bake.toml"), "[tasks]\n").unwrap();

        let source = LocalTaskSource::new(Some(PathBuf::from("ops/bake.toml")), dir.path().to_path_buf());
        assert!(source.read_taskfile().unwrap().is_some());
        assert_eq!(source.base_dir().unwrap(), dir.path().join("ops"));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = LocalTaskSource::new(Some(PathBuf::from("nope.toml")), dir.path().to_path_buf());
        assert!(source.read_taskfile().is_err());
    }
}
