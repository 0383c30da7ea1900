//! Migration runner.
//!
//! Executes every migration file in name order, one statement at a time,
//! against a single executor. Nothing records which files ran before:
//! re-running is safe only as far as the SQL guards itself (`IF NOT EXISTS`)
//! or fails with an error classified as already applied.
//!
//! Statements are not wrapped in a transaction. An aborted run leaves every
//! statement before the failing one applied.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use migrator_core::config::{MigrationsConfig, SplitMode};
use migrator_core::error::Result;

use super::classify::{preview, ExecutionOutcome};
use super::file::{discover, MigrationFile};
use super::parser::{split_statements, Statement};
use super::reporter::ProgressReporter;
use super::summary::{RunStatus, RunSummary, SkippedStatement, StatementFailure};
use crate::db::StatementExecutor;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Discovering,
    ProcessingFile,
    Summarizing,
    Done,
    Aborted,
}

/// Options controlling discovery and execution.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub dir: PathBuf,
    pub extension: String,
    pub split_mode: SplitMode,
    pub preview_chars: usize,
    /// File names that trigger a destructive-operation warning.
    pub destructive_files: Vec<String>,
}

impl RunnerOptions {
    pub fn from_config(config: &MigrationsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            extension: config.extension.clone(),
            split_mode: config.splitter,
            preview_chars: config.preview_chars,
            destructive_files: config.destructive.clone(),
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_split_mode(mut self, mode: SplitMode) -> Self {
        self.split_mode = mode;
        self
    }

    fn is_destructive(&self, file: &MigrationFile) -> bool {
        self.destructive_files.iter().any(|name| *name == file.name)
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from_config(&MigrationsConfig::default())
    }
}

enum FileResult {
    Complete,
    Aborted {
        failure: StatementFailure,
        remaining: usize,
    },
}

/// Runs migration files against an executor.
pub struct MigrationRunner<'a, E, R> {
    executor: &'a mut E,
    reporter: &'a mut R,
    options: RunnerOptions,
    phase: RunPhase,
}

impl<'a, E, R> MigrationRunner<'a, E, R>
where
    E: StatementExecutor,
    R: ProgressReporter,
{
    pub fn new(executor: &'a mut E, reporter: &'a mut R, options: RunnerOptions) -> Self {
        Self {
            executor,
            reporter,
            options,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn transition(&mut self, phase: RunPhase) {
        debug!("Runner phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Run every migration file.
    ///
    /// A statement failure that is not classified as already applied stops
    /// the run and is reported through [`RunStatus::Aborted`]; use
    /// [`RunSummary::into_result`] to turn it into an error. `Err` is only
    /// returned when discovery fails, before anything executes.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let clock = Instant::now();

        self.transition(RunPhase::Discovering);
        let files = match discover(&self.options.dir, &self.options.extension) {
            Ok(files) => files,
            Err(e) => {
                self.transition(RunPhase::Aborted);
                return Err(e);
            }
        };
        self.reporter.discovered(&self.options.dir, &files);
        info!("Found {} migration files in {:?}", files.len(), self.options.dir);

        let mut summary = RunSummary::new(started_at, files.len());

        for (index, file) in files.iter().enumerate() {
            self.transition(RunPhase::ProcessingFile);

            match self.apply_migration(file, &mut summary).await {
                FileResult::Complete => summary.files_processed += 1,
                FileResult::Aborted { failure, remaining } => {
                    summary.statements_remaining =
                        remaining + count_statements(&files[index + 1..], self.options.split_mode);
                    summary.status = RunStatus::Aborted(failure);
                    break;
                }
            }
        }

        self.transition(RunPhase::Summarizing);
        summary.elapsed_ms = clock.elapsed().as_millis() as u64;

        match &summary.status {
            RunStatus::Done => {
                info!(
                    "Migrations complete: {} files, {} executed, {} skipped",
                    summary.files_processed, summary.statements_executed, summary.statements_skipped
                );
                self.transition(RunPhase::Done);
            }
            RunStatus::Aborted(failure) => {
                self.reporter.aborted(failure);
                self.transition(RunPhase::Aborted);
            }
        }

        self.reporter.finished(&summary);
        Ok(summary)
    }

    async fn apply_migration(&mut self, file: &MigrationFile, summary: &mut RunSummary) -> FileResult {
        let statements = split_statements(&file.content, self.options.split_mode);

        if statements.is_empty() {
            info!("Skipping empty migration: {}", file.name);
            summary.files_empty += 1;
            self.reporter.file_empty(file);
            return FileResult::Complete;
        }

        info!("Applying migration: {} ({} statements)", file.name, statements.len());
        self.reporter.file_started(file, statements.len());

        if self.options.is_destructive(file) {
            warn!(
                "Migration {} deletes existing data (table truncation)",
                file.name
            );
            self.reporter.destructive_warning(file);
        }

        for (index, statement) in statements.iter().enumerate() {
            debug!("{} #{}: {}", file.name, statement.ordinal, statement.sql);

            let result = self.executor.execute(&statement.sql).await;
            let outcome = ExecutionOutcome::from_result(&result);
            self.reporter.statement_finished(file, statement, &outcome);

            match (outcome, result) {
                (ExecutionOutcome::Succeeded, _) => summary.statements_executed += 1,
                (ExecutionOutcome::SkippedAlreadyApplied(reason), result) => {
                    let message = result.err().map(|e| e.message).unwrap_or_default();
                    info!(
                        "Skipping {} #{} ({}): {}",
                        file.name, statement.ordinal, reason, message
                    );
                    summary.statements_skipped += 1;
                    summary.skipped.push(SkippedStatement {
                        file: file.name.clone(),
                        ordinal: statement.ordinal,
                        reason,
                        message,
                    });
                }
                (ExecutionOutcome::Failed(message), result) => {
                    let code = result.err().and_then(|e| e.code);
                    let failure = self.failure(file, statement, code, message);
                    return FileResult::Aborted {
                        failure,
                        remaining: statements.len() - index - 1,
                    };
                }
            }
        }

        info!("Migration applied: {}", file.name);
        self.reporter.file_finished(file);
        FileResult::Complete
    }

    fn failure(
        &self,
        file: &MigrationFile,
        statement: &Statement,
        code: Option<String>,
        message: String,
    ) -> StatementFailure {
        let preview = preview(&statement.sql, self.options.preview_chars);
        error!(
            "Migration {} failed at statement #{}: {}\n{}",
            file.name, statement.ordinal, message, preview
        );
        StatementFailure {
            file: file.name.clone(),
            ordinal: statement.ordinal,
            preview,
            code,
            message,
        }
    }
}

fn count_statements(files: &[MigrationFile], mode: SplitMode) -> usize {
    files
        .iter()
        .map(|f| split_statements(&f.content, mode).len())
        .sum()
}

/// List what a run would execute, without touching a database.
pub fn plan<R: ProgressReporter>(options: &RunnerOptions, reporter: &mut R) -> Result<RunSummary> {
    let clock = Instant::now();
    let files = discover(&options.dir, &options.extension)?;
    reporter.discovered(&options.dir, &files);

    let mut summary = RunSummary::new(Utc::now(), files.len());

    for file in &files {
        let statements = split_statements(&file.content, options.split_mode);
        if statements.is_empty() {
            summary.files_empty += 1;
            reporter.file_empty(file);
        } else {
            reporter.file_started(file, statements.len());
            if options.is_destructive(file) {
                reporter.destructive_warning(file);
            }
            for statement in &statements {
                reporter.statement_planned(file, statement);
            }
            summary.statements_planned += statements.len();
            reporter.file_finished(file);
        }
        summary.files_processed += 1;
    }

    summary.elapsed_ms = clock.elapsed().as_millis() as u64;
    reporter.finished(&summary);
    Ok(summary)
}
