use crate::{output, ux_error};
use anyhow::Result;
use clap::Args;
use lifecycle::{FATAL_EXIT_CODE, Lifecycle, SuiteContext, SuiteOutcome};
use std::path::PathBuf;
use storage::SqlScript;

/// Exit status reported when the test command cannot be spawned.
const SPAWN_FAILED_EXIT_CODE: i32 = 127;

#[derive(Args)]
pub struct RunArgs {
    #[arg(
        long,
        short,
        env = "PGSCRATCH_CONFIG",
        default_value = "pgscratch.toml",
        help = "Path to the config file"
    )]
    pub config: PathBuf,

    #[arg(long, help = "Abort when the schema dump or import fails")]
    pub strict: bool,

    #[arg(long, help = "Pin the name seed to reproduce an earlier run")]
    pub seed: Option<u64>,

    #[arg(
        long = "table",
        value_name = "TABLE",
        help = "Table whose triggers to disable (repeatable; default: every table)"
    )]
    pub tables: Vec<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Load the schema from this SQL file instead of running pg_dump and psql"
    )]
    pub schema_file: Option<PathBuf>,

    #[arg(
        last = true,
        required = true,
        value_name = "COMMAND",
        help = "Test command to run against the ephemeral database"
    )]
    pub command: Vec<String>
}

pub async fn run(args: RunArgs) -> Result<i32> {
    let mut config = match super::load_config(&args.config) {
        Ok(config) => config,
        Err(code) => return Ok(code)
    };
    config.harness.strict |= args.strict;
    if args.seed.is_some() {
        config.harness.seed = args.seed;
    }
    if !args.tables.is_empty() {
        config.harness.tables = args.tables;
    }

    let lifecycle = match &args.schema_file {
        Some(path) => match SqlScript::from_file(path) {
            Ok(script) => Lifecycle::new(config, script),
            Err(e) => {
                ux_error::schema_file_unreadable(path, &e).display();
                return Ok(FATAL_EXIT_CODE);
            }
        },
        None => Lifecycle::with_pg_tools(config)
    };

    let command = args.command;
    let result = lifecycle
        .run(async |ctx: &mut SuiteContext| run_suite(&command, ctx).await)
        .await;

    match result {
        Ok(report) => {
            output::outcome(&report.database, report.outcome);
            Ok(report.exit_code())
        }
        Err(err) => {
            if let Some(outcome) = err.suite_outcome() {
                output::outcome(&command.join(" "), outcome);
            }
            ux_error::lifecycle_failed(&err).display();
            Ok(err.exit_code())
        }
    }
}

/// Spawn the test command with the ephemeral database in its environment
/// and wait for it.
async fn run_suite(command: &[String], ctx: &mut SuiteContext) -> SuiteOutcome {
    let Some((program, rest)) = command.split_first() else {
        return SuiteOutcome::Failed {
            code: FATAL_EXIT_CODE
        };
    };

    let url = match ctx.database_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build DATABASE_URL");
            return SuiteOutcome::Failed {
                code: FATAL_EXIT_CODE
            };
        }
    };
    let cfg = ctx.config();

    tracing::info!(program = %program, database = %cfg.dbname, "Running test command");
    let status = tokio::process::Command::new(program)
        .args(rest)
        .env("DATABASE_URL", url)
        .env("PGHOST", &cfg.host)
        .env("PGPORT", cfg.port.to_string())
        .env("PGUSER", &cfg.user)
        .env("PGDATABASE", &cfg.dbname)
        .status()
        .await;

    match status {
        Ok(status) => SuiteOutcome::from_exit_code(status.code().unwrap_or(FATAL_EXIT_CODE)),
        Err(e) => {
            tracing::error!(program = %program, error = %e, "Failed to spawn test command");
            SuiteOutcome::Failed {
                code: SPAWN_FAILED_EXIT_CODE
            }
        }
    }
}
