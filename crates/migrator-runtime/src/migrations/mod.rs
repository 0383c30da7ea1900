mod classify;
mod file;
mod parser;
mod reporter;
mod runner;
mod summary;

pub use classify::{classify, preview, ExecutionOutcome, SkipReason};
pub use file::{discover, MigrationFile};
pub use parser::{split_statements, SplitMode, Statement};
pub use reporter::{NoopReporter, ProgressReporter, RecordingReporter, ReportEvent};
pub use runner::{plan, MigrationRunner, RunPhase, RunnerOptions};
pub use summary::{RunStatus, RunSummary, SkippedStatement, StatementFailure};
