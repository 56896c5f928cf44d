pub mod cleanup;
pub mod name;
pub mod run;

use crate::ux_error;
use clap::{Parser, Subcommand};
use config::HarnessConfig;
use lifecycle::FATAL_EXIT_CODE;
use std::path::Path;

#[derive(Parser)]
#[command(
    name = "pgscratch",
    author,
    version,
    about = "pgscratch - throwaway Postgres databases for integration tests",
    long_about = "Copies the schema of a source database into a freshly created database, \
                  runs your test command against it, then drops it again.\n\nConnection \
                  settings come from a TOML or YAML config file with a [postgres] section; \
                  PG_HOST, PG_PORT, PG_USER, PG_PASSWORD and PG_DBNAME override it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Provision an ephemeral database, run a test command, tear it down")]
    Run(run::RunArgs),

    #[command(about = "Print the ephemeral database name for a seed")]
    Name(name::NameArgs),

    #[command(about = "Drop ephemeral databases left behind by aborted runs")]
    Cleanup(cleanup::CleanupArgs)
}

/// Load the config file, printing the diagnostic and returning the exit
/// code on failure.
pub(crate) fn load_config(path: &Path) -> Result<HarnessConfig, i32> {
    config::load(path).map_err(|e| {
        ux_error::config_failed(path, &e).display();
        FATAL_EXIT_CODE
    })
}
