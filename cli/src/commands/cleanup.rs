use crate::{output, ux_error};
use anyhow::Result;
use clap::Args;
use lifecycle::FATAL_EXIT_CODE;
use std::path::PathBuf;
use storage::CleanupReport;

#[derive(Args)]
pub struct CleanupArgs {
    #[arg(
        long,
        short,
        env = "PGSCRATCH_CONFIG",
        default_value = "pgscratch.toml",
        help = "Path to the config file"
    )]
    pub config: PathBuf,

    #[arg(long, help = "List leftover databases without dropping them")]
    pub dry_run: bool
}

pub async fn run(args: CleanupArgs) -> Result<i32> {
    let config = match super::load_config(&args.config) {
        Ok(config) => config,
        Err(code) => return Ok(code)
    };
    let source = &config.postgres;

    let result = if args.dry_run {
        storage::list_ephemeral_databases(source)
            .await
            .map(|names| CleanupReport {
                dropped: names,
                failed: Vec::new()
            })
    } else {
        storage::cleanup_stale(source).await
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            ux_error::cleanup_failed(&source.dbname, &e).display();
            return Ok(FATAL_EXIT_CODE);
        }
    };

    if report.dropped.is_empty() && report.is_complete() {
        output::info(&format!("No leftover databases for {}", source.dbname));
        return Ok(0);
    }

    let verb = if args.dry_run { "Would drop" } else { "Dropped" };
    for name in &report.dropped {
        output::success(&format!("{} {}", verb, name));
    }

    if report.is_complete() {
        return Ok(0);
    }
    ux_error::cleanup_incomplete(&source.dbname, &report.failed).display();
    Ok(FATAL_EXIT_CODE)
}
