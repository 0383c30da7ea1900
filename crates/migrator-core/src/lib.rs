pub mod config;
pub mod error;

pub use config::{DatabaseConfig, MigrationsConfig, MigratorConfig, SplitMode};
pub use error::{MigratorError, Result};
