use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
pub mod ux_error;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run(args) => commands::run::run(args).await?,
        Commands::Name(args) => commands::name::run(args)?,
        Commands::Cleanup(args) => commands::cleanup::run(args).await?
    };

    std::process::exit(code)
}
