use std::path::Path;

use super::classify::ExecutionOutcome;
use super::file::MigrationFile;
use super::parser::Statement;
use super::summary::{RunSummary, StatementFailure};

/// Receives progress events from a migration run.
///
/// All methods default to doing nothing.
pub trait ProgressReporter {
    fn discovered(&mut self, _dir: &Path, _files: &[MigrationFile]) {}

    fn file_started(&mut self, _file: &MigrationFile, _statements: usize) {}

    /// The file has nothing to execute.
    fn file_empty(&mut self, _file: &MigrationFile) {}

    /// The file is known to delete data.
    fn destructive_warning(&mut self, _file: &MigrationFile) {}

    /// Plan mode: the statement would run.
    fn statement_planned(&mut self, _file: &MigrationFile, _statement: &Statement) {}

    fn statement_finished(
        &mut self,
        _file: &MigrationFile,
        _statement: &Statement,
        _outcome: &ExecutionOutcome,
    ) {
    }

    fn file_finished(&mut self, _file: &MigrationFile) {}

    fn aborted(&mut self, _failure: &StatementFailure) {}

    fn finished(&mut self, _summary: &RunSummary) {}
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}

/// A recorded progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Discovered(usize),
    FileStarted { file: String, statements: usize },
    FileEmpty(String),
    DestructiveWarning(String),
    StatementPlanned { file: String, ordinal: usize },
    StatementFinished {
        file: String,
        ordinal: usize,
        outcome: ExecutionOutcome,
    },
    FileFinished(String),
    Aborted { file: String, ordinal: usize },
    Finished,
}

/// Reporter that keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub events: Vec<ReportEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes of finished statements as `(file, ordinal, outcome)`.
    pub fn outcomes(&self) -> Vec<(String, usize, ExecutionOutcome)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::StatementFinished {
                    file,
                    ordinal,
                    outcome,
                } => Some((file.clone(), *ordinal, outcome.clone())),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn discovered(&mut self, _dir: &Path, files: &[MigrationFile]) {
        self.events.push(ReportEvent::Discovered(files.len()));
    }

    fn file_started(&mut self, file: &MigrationFile, statements: usize) {
        self.events.push(ReportEvent::FileStarted {
            file: file.name.clone(),
            statements,
        });
    }

    fn file_empty(&mut self, file: &MigrationFile) {
        self.events.push(ReportEvent::FileEmpty(file.name.clone()));
    }

    fn destructive_warning(&mut self, file: &MigrationFile) {
        self.events
            .push(ReportEvent::DestructiveWarning(file.name.clone()));
    }

    fn statement_planned(&mut self, file: &MigrationFile, statement: &Statement) {
        self.events.push(ReportEvent::StatementPlanned {
            file: file.name.clone(),
            ordinal: statement.ordinal,
        });
    }

    fn statement_finished(
        &mut self,
        file: &MigrationFile,
        statement: &Statement,
        outcome: &ExecutionOutcome,
    ) {
        self.events.push(ReportEvent::StatementFinished {
            file: file.name.clone(),
            ordinal: statement.ordinal,
            outcome: outcome.clone(),
        });
    }

    fn file_finished(&mut self, file: &MigrationFile) {
        self.events.push(ReportEvent::FileFinished(file.name.clone()));
    }

    fn aborted(&mut self, failure: &StatementFailure) {
        self.events.push(ReportEvent::Aborted {
            file: failure.file.clone(),
            ordinal: failure.ordinal,
        });
    }

    fn finished(&mut self, _summary: &RunSummary) {
        self.events.push(ReportEvent::Finished);
    }
}
