pub mod db;
pub mod migrations;
pub mod testing;

pub use db::{Database, ExecutionError, StatementExecutor};
pub use migrations::{MigrationRunner, RunSummary, RunnerOptions};
