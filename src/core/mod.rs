pub mod plan;
pub mod registry;
pub mod runner;
pub mod template;

pub use crate::domain::model::{Binding, Bindings, PreparedCommand, RunReport};
pub use crate::domain::ports::{CommandExecutor, TaskSource};
pub use crate::utils::error::Result;
