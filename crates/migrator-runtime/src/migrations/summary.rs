use chrono::{DateTime, Utc};
use serde::Serialize;

use migrator_core::error::{MigratorError, Result};

use super::classify::SkipReason;

/// The statement that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    /// File the statement came from.
    pub file: String,
    /// 1-based statement position within the file.
    pub ordinal: usize,
    /// Truncated statement text.
    pub preview: String,
    /// SQLSTATE code, if the database reported one.
    pub code: Option<String>,
    /// Database error message.
    pub message: String,
}

/// A statement treated as already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStatement {
    pub file: String,
    pub ordinal: usize,
    pub reason: SkipReason,
    pub message: String,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunStatus {
    Done,
    Aborted(StatementFailure),
}

/// Final report of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Files found in the migrations directory.
    pub files_discovered: usize,
    /// Files whose statements all ran (or were skipped), including empty files.
    pub files_processed: usize,
    /// Files with nothing to execute.
    pub files_empty: usize,
    /// Statements listed without executing (plan mode only).
    pub statements_planned: usize,
    pub statements_executed: usize,
    pub statements_skipped: usize,
    /// Statements never attempted because the run aborted.
    pub statements_remaining: usize,
    pub skipped: Vec<SkippedStatement>,
    pub status: RunStatus,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, files_discovered: usize) -> Self {
        Self {
            started_at,
            elapsed_ms: 0,
            files_discovered,
            files_processed: 0,
            files_empty: 0,
            statements_planned: 0,
            statements_executed: 0,
            statements_skipped: 0,
            statements_remaining: 0,
            skipped: Vec::new(),
            status: RunStatus::Done,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Done)
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn failure(&self) -> Option<&StatementFailure> {
        match &self.status {
            RunStatus::Done => None,
            RunStatus::Aborted(failure) => Some(failure),
        }
    }

    /// Turn an aborted run into an error.
    pub fn into_result(self) -> Result<RunSummary> {
        if let Some(failure) = self.failure() {
            return Err(MigratorError::StatementFailed {
                file: failure.file.clone(),
                ordinal: failure.ordinal,
                message: failure.message.clone(),
            });
        }
        Ok(self)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MigratorError::Serialization(e.to_string()))
    }
}
