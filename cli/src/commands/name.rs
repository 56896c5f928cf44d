use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct NameArgs {
    #[arg(
        long,
        short,
        env = "PGSCRATCH_CONFIG",
        default_value = "pgscratch.toml",
        help = "Path to the config file"
    )]
    pub config: PathBuf,

    #[arg(long, help = "Seed to derive the name from (default: [harness].seed, else random)")]
    pub seed: Option<u64>
}

pub fn run(args: NameArgs) -> Result<i32> {
    let config = match super::load_config(&args.config) {
        Ok(config) => config,
        Err(code) => return Ok(code)
    };

    let seed = args
        .seed
        .or(config.harness.seed)
        .unwrap_or_else(utils::random_seed);
    println!("{}", utils::derive_test_db_name(&config.postgres.dbname, seed));
    Ok(0)
}
