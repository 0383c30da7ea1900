//! Console rendering of migration progress.

use std::path::Path;

use console::style;

use migrator_runtime::migrations::{
    preview, ExecutionOutcome, MigrationFile, ProgressReporter, RunStatus, RunSummary, Statement,
    StatementFailure,
};

/// Characters of a statement shown on a progress line.
const LINE_PREVIEW_CHARS: usize = 72;

/// Prints styled progress lines; failures go to stderr.
pub struct ConsoleReporter {
    enabled: bool,
}

impl ConsoleReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Collapse whitespace so a statement fits on one line.
pub fn one_line(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    preview(&flat, max_chars)
}

impl ProgressReporter for ConsoleReporter {
    fn discovered(&mut self, dir: &Path, files: &[MigrationFile]) {
        if !self.enabled {
            return;
        }
        if files.is_empty() {
            println!(
                "  {} No migrations found in {}",
                style("ℹ").blue(),
                dir.display()
            );
        } else {
            println!(
                "  {} Found {} migration file(s) in {}",
                style("→").dim(),
                files.len(),
                dir.display()
            );
        }
        println!();
    }

    fn file_started(&mut self, file: &MigrationFile, statements: usize) {
        if self.enabled {
            println!(
                "  {} {} {}",
                style("▸").cyan(),
                style(&file.name).bold(),
                style(format!("({} statements)", statements)).dim()
            );
        }
    }

    fn file_empty(&mut self, file: &MigrationFile) {
        if self.enabled {
            println!(
                "  {} {} {}",
                style("○").dim(),
                style(&file.name).dim(),
                style("(empty, skipped)").dim()
            );
        }
    }

    fn destructive_warning(&mut self, file: &MigrationFile) {
        if self.enabled {
            println!(
                "    {} {} truncates existing data before rebuilding it",
                style("⚠").yellow().bold(),
                style(&file.name).yellow()
            );
        }
    }

    fn statement_planned(&mut self, _file: &MigrationFile, statement: &Statement) {
        if self.enabled {
            println!(
                "    {} {}",
                style(format!("{:>3}.", statement.ordinal)).dim(),
                one_line(&statement.sql, LINE_PREVIEW_CHARS)
            );
        }
    }

    fn statement_finished(
        &mut self,
        _file: &MigrationFile,
        statement: &Statement,
        outcome: &ExecutionOutcome,
    ) {
        if !self.enabled {
            return;
        }
        let line = one_line(&statement.sql, LINE_PREVIEW_CHARS);
        match outcome {
            ExecutionOutcome::Succeeded => {
                println!(
                    "    {} #{} {}",
                    style("✓").green(),
                    statement.ordinal,
                    style(line).dim()
                );
            }
            ExecutionOutcome::SkippedAlreadyApplied(reason) => {
                println!(
                    "    {} #{} skipped, {} {}",
                    style("○").yellow(),
                    statement.ordinal,
                    reason,
                    style(line).dim()
                );
            }
            ExecutionOutcome::Failed(_) => {
                eprintln!(
                    "    {} #{} {}",
                    style("✗").red().bold(),
                    statement.ordinal,
                    line
                );
            }
        }
    }

    fn file_finished(&mut self, _file: &MigrationFile) {
        if self.enabled {
            println!();
        }
    }

    fn aborted(&mut self, failure: &StatementFailure) {
        // Always shown, even in JSON mode.
        eprintln!();
        eprintln!(
            "  {} {} statement #{} failed: {}",
            style("✗").red().bold(),
            failure.file,
            failure.ordinal,
            style(&failure.message).red()
        );
        if let Some(code) = &failure.code {
            eprintln!("    {} {}", style("SQLSTATE").dim(), code);
        }
        eprintln!("    {}", style(&failure.preview).dim());
        eprintln!();
    }
}

/// Print the final counts.
pub fn print_summary(summary: &RunSummary) {
    let mark = match summary.status {
        RunStatus::Done => style("✓").green(),
        RunStatus::Aborted(_) => style("✗").red(),
    };

    println!(
        "  {} {} file(s) processed, {} statement(s) executed, {} skipped",
        mark, summary.files_processed, summary.statements_executed, summary.statements_skipped
    );
    if summary.files_empty > 0 {
        println!("    {} empty file(s) skipped", summary.files_empty);
    }
    if let RunStatus::Aborted(failure) = &summary.status {
        println!(
            "    {} statement(s) not executed after failure in {}",
            summary.statements_remaining, failure.file
        );
    }
    println!(
        "  {} finished in {} ms",
        style("ℹ").blue(),
        summary.elapsed_ms
    );
    println!();
}

/// Print the final counts of a plan.
pub fn print_plan_summary(summary: &RunSummary) {
    println!(
        "  {} {} file(s), {} statement(s) would run",
        style("ℹ").blue(),
        summary.files_processed,
        summary.statements_planned
    );
    if summary.files_empty > 0 {
        println!("    {} empty file(s) would be skipped", summary.files_empty);
    }
    println!();
}
