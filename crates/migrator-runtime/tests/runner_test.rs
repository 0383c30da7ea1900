use std::fs;
use std::path::Path;

use migrator_runtime::migrations::{
    ExecutionOutcome, MigrationRunner, RecordingReporter, ReportEvent, RunnerOptions, SkipReason,
    SplitMode,
};
use migrator_runtime::testing::{CatalogExecutor, ScriptedExecutor};
use migrator_runtime::{ExecutionError, StatementExecutor};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, sql: &str) {
    fs::write(dir.join(name), sql).unwrap();
}

fn options(dir: &TempDir) -> RunnerOptions {
    RunnerOptions::default().with_dir(dir.path())
}

async fn run_with<E: StatementExecutor>(
    executor: &mut E,
    options: RunnerOptions,
) -> (migrator_runtime::RunSummary, RecordingReporter) {
    let mut reporter = RecordingReporter::new();
    let summary = MigrationRunner::new(executor, &mut reporter, options)
        .run()
        .await
        .unwrap();
    (summary, reporter)
}

fn started_files(reporter: &RecordingReporter) -> Vec<String> {
    reporter
        .events
        .iter()
        .filter_map(|e| match e {
            ReportEvent::FileStarted { file, .. } => Some(file.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn files_run_in_lexical_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_init.sql", "SELECT 'init';\n");
    write(dir.path(), "010_add_col.sql", "SELECT 'add col';\n");
    write(dir.path(), "002_add_index.sql", "SELECT 'add index';\n");

    let mut executor = ScriptedExecutor::new();
    let (summary, reporter) = run_with(&mut executor, options(&dir)).await;

    assert!(summary.is_success());
    assert_eq!(summary.files_processed, 3);
    assert_eq!(
        started_files(&reporter),
        ["001_init.sql", "002_add_index.sql", "010_add_col.sql"]
    );
    assert_eq!(
        executor.executed(),
        ["SELECT 'init'", "SELECT 'add index'", "SELECT 'add col'"]
    );
}

#[tokio::test]
async fn existing_table_is_skipped_and_index_still_attempted() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "001_offers.sql",
        "CREATE TABLE x (c INT);\nCREATE INDEX IF NOT EXISTS idx ON x(c);\n",
    );

    let mut db = CatalogExecutor::new();
    db.execute("CREATE TABLE x (c INT)").await.unwrap();

    let (summary, reporter) = run_with(&mut db, options(&dir)).await;

    assert!(summary.is_success());
    assert_eq!(
        reporter.outcomes(),
        vec![
            (
                "001_offers.sql".to_string(),
                1,
                ExecutionOutcome::SkippedAlreadyApplied(SkipReason::AlreadyExists)
            ),
            ("001_offers.sql".to_string(), 2, ExecutionOutcome::Succeeded),
        ]
    );
    assert!(db.contains("idx"));
}

#[tokio::test]
async fn heuristic_skips_whole_line_when_table_exists() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "001_offers.sql",
        "CREATE TABLE x (c INT); CREATE INDEX IF NOT EXISTS idx ON x(c);\n",
    );

    let mut executor = ScriptedExecutor::new().fail_when(
        "CREATE TABLE x",
        ExecutionError::with_code("42P07", "relation \"x\" already exists"),
    );
    let (summary, _) = run_with(&mut executor, options(&dir)).await;

    assert!(summary.is_success());
    assert_eq!(executor.executed().len(), 1);
    assert_eq!(summary.statements_skipped, 1);
    assert_eq!(summary.statements_executed, 0);
}

#[tokio::test]
async fn tokenizer_splits_statements_sharing_a_line() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "001_offers.sql",
        "CREATE TABLE x (c INT); CREATE INDEX IF NOT EXISTS idx ON x(c);",
    );

    let mut executor = ScriptedExecutor::new();
    let (summary, _) = run_with(
        &mut executor,
        options(&dir).with_split_mode(SplitMode::Tokenizer),
    )
    .await;

    assert_eq!(summary.statements_executed, 2);
    assert_eq!(
        executor.executed(),
        ["CREATE TABLE x (c INT)", "CREATE INDEX IF NOT EXISTS idx ON x(c)"]
    );
}

#[tokio::test]
async fn missing_target_is_skipped() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "001_cleanup.sql",
        "ALTER TABLE offers DROP COLUMN legacy_rate;\nSELECT 1;\n",
    );

    let mut executor = ScriptedExecutor::new().fail_when(
        "legacy_rate",
        ExecutionError::new("column \"legacy_rate\" of relation \"offers\" does not exist"),
    );
    let (summary, _) = run_with(&mut executor, options(&dir)).await;

    assert!(summary.is_success());
    assert_eq!(summary.statements_skipped, 1);
    assert_eq!(summary.skipped[0].reason, SkipReason::DoesNotExist);
    assert_eq!(summary.statements_executed, 1);
}

#[tokio::test]
async fn fatal_error_stops_later_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_users.sql", "CREATE TABLE users (id INT);\n");
    write(
        dir.path(),
        "002_applications.sql",
        "INSERT INTO applications VALUES (1);\nSELECT 2;\n",
    );
    write(dir.path(), "003_clicks.sql", "SELECT 3;\nSELECT 4;\n");

    let mut executor = ScriptedExecutor::new().fail_when(
        "INSERT INTO applications",
        ExecutionError::with_code("23503", "violates foreign key constraint \"fk_offer\""),
    );
    let (summary, reporter) = run_with(&mut executor, options(&dir)).await;

    assert!(!summary.is_success());
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.statements_executed, 1);
    assert_eq!(summary.statements_remaining, 3);
    assert_eq!(
        executor.executed(),
        ["CREATE TABLE users (id INT)", "INSERT INTO applications VALUES (1)"]
    );
    assert_eq!(started_files(&reporter), ["001_users.sql", "002_applications.sql"]);
    assert_eq!(reporter.events.last(), Some(&ReportEvent::Finished));

    let err = summary.into_result().unwrap_err();
    assert!(err.is_statement_failure());
}

#[tokio::test]
async fn guarded_migrations_converge_on_second_run() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "001_init.sql",
        "-- core tables\n\
         CREATE TABLE IF NOT EXISTS users (id SERIAL PRIMARY KEY);\n\
         CREATE TABLE IF NOT EXISTS offers (id SERIAL PRIMARY KEY);\n",
    );
    write(
        dir.path(),
        "002_indexes.sql",
        "CREATE INDEX IF NOT EXISTS idx_offers_id ON offers(id);\n",
    );

    let mut db = CatalogExecutor::new();

    let (first, _) = run_with(&mut db, options(&dir)).await;
    assert!(first.is_success());
    assert_eq!(first.statements_executed, 3);

    let (second, reporter) = run_with(&mut db, options(&dir)).await;
    assert!(second.is_success());
    assert_eq!(second.statements_executed, 3);
    assert!(reporter
        .outcomes()
        .iter()
        .all(|(_, _, outcome)| !outcome.is_fatal()));
}

#[tokio::test]
async fn unguarded_migrations_rerun_through_skips() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "001_init.sql",
        "CREATE TABLE users (id INT);\nCREATE INDEX idx_users ON users(id);\n",
    );

    let mut db = CatalogExecutor::new();

    let (first, _) = run_with(&mut db, options(&dir)).await;
    assert_eq!(first.statements_executed, 2);

    let (second, _) = run_with(&mut db, options(&dir)).await;
    assert!(second.is_success());
    assert_eq!(second.statements_executed, 0);
    assert_eq!(second.statements_skipped, 2);
}

#[tokio::test]
async fn empty_files_do_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_placeholder.sql", "");
    write(dir.path(), "002_users.sql", "CREATE TABLE users (id INT);\n");

    let mut db = CatalogExecutor::new();
    let (summary, reporter) = run_with(&mut db, options(&dir)).await;

    assert!(summary.is_success());
    assert_eq!(summary.files_empty, 1);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(reporter.events[1], ReportEvent::FileEmpty("001_placeholder.sql".into()));
}
