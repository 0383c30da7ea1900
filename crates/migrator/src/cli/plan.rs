use anyhow::Result;
use console::style;

use migrator_runtime::migrations::{plan, RunnerOptions};

use super::output::{print_plan_summary, ConsoleReporter};
use super::GlobalArgs;

/// List statements in execution order without connecting to the database.
pub fn execute(args: &GlobalArgs) -> Result<()> {
    let config = args.load_config()?;
    let options = RunnerOptions::from_config(&config.migrations);

    if !args.json {
        println!();
        println!(
            "  {}  {} ({} splitter)",
            style("⚒️").bold(),
            style("Migration Plan").bold().cyan(),
            options.split_mode
        );
        println!();
    }

    let mut reporter = ConsoleReporter::new(!args.json);
    let summary = plan(&options, &mut reporter)?;

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        print_plan_summary(&summary);
    }

    Ok(())
}
