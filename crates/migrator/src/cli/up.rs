use anyhow::Result;
use console::style;
use tracing::warn;

use migrator_core::config::DatabaseConfig;
use migrator_runtime::migrations::{MigrationRunner, RunSummary, RunnerOptions};
use migrator_runtime::Database;

use super::output::{print_summary, ConsoleReporter};
use super::GlobalArgs;

/// Apply every migration file.
pub async fn execute(args: &GlobalArgs) -> Result<()> {
    let config = args.load_config()?;
    let options = RunnerOptions::from_config(&config.migrations);

    let (url, fallback) = config.database.resolve_url(args.database_url.as_deref());
    if fallback {
        warn!("DATABASE_URL is not set; connecting with the built-in default connection string");
    }

    if !args.json {
        println!();
        println!(
            "  {}  {} v{}",
            style("⚒️").bold(),
            style("Migrations").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!();
    }

    let mut db = Database::connect(&url, &config.database).await?;
    db.health_check().await?;
    let mut reporter = ConsoleReporter::new(!args.json);

    let result = run_locked(&mut db, &config.database, &mut reporter, options).await;
    db.close().await;
    let summary = result?;

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        print_summary(&summary);
    }

    summary.into_result()?;
    Ok(())
}

/// Run the migrations, holding the advisory lock if configured.
async fn run_locked(
    db: &mut Database,
    config: &DatabaseConfig,
    reporter: &mut ConsoleReporter,
    options: RunnerOptions,
) -> migrator_core::Result<RunSummary> {
    if config.lock {
        db.acquire_lock(config.lock_key).await?;
    }

    let result = MigrationRunner::new(&mut *db, &mut *reporter, options).run().await;

    // Always release lock, even on error
    if config.lock {
        if let Err(e) = db.release_lock(config.lock_key).await {
            warn!("Failed to release migration lock: {}", e);
        }
    }

    result
}
