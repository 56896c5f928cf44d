use colored::Colorize;
use errors::{ConfigError, SqlError};
use lifecycle::LifecycleError;
use std::path::Path;

/// Diagnostic printed to standard output before a fatal exit.
#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        println!();
        println!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            println!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            println!();
            println!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                println!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            println!();
            println!("{}", "Try this:".green().bold());
            println!("  $ {}", cmd.cyan());
        }
        println!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn config_failed(path: &Path, err: &ConfigError) -> UxError {
    let path = path.display();
    match err {
        ConfigError::NotFound { .. } => {
            UxError::new(format!("Config file not found: '{}'", path))
                .why("pgscratch needs a [postgres] section naming the source database")
                .fix("Create the file with user, pass, host, port and dbname under [postgres]")
                .fix("Or point --config at an existing file")
                .suggest(format!("pgscratch name --config {}", path))
        }
        ConfigError::Malformed { reason, .. } => {
            UxError::new(format!("Could not parse config file '{}'", path))
                .why(reason.clone())
                .fix("Config files must be TOML (.toml) or YAML (.yaml, .yml)")
                .fix("Check PG_PORT and PGSCRATCH_SEED hold numbers if they are set")
        }
        ConfigError::Invalid { reason } => {
            UxError::new(format!("Invalid configuration in '{}'", path))
                .why(reason.clone())
                .fix("user, host and dbname must be non-empty and port between 1 and 65535")
        }
        ConfigError::Io { reason, .. } => {
            UxError::new(format!("Could not read config file '{}'", path))
                .why(reason.clone())
                .fix("Check the file permissions")
        }
    }
}

pub fn lifecycle_failed(err: &LifecycleError) -> UxError {
    let base = UxError::new(err.to_string()).why(format!("Run stopped after stage '{}'", err.stage()));

    let base = match err {
        LifecycleError::Config { .. } => base.fix("Fix the configuration and run again"),
        LifecycleError::DumpFile { .. } => base.fix("Check that the temp directory is writable"),
        LifecycleError::Export { .. } => base
            .fix("Check that pg_dump is on PATH and matches the server version")
            .fix("Drop --strict to continue past dump failures"),
        LifecycleError::Provision { .. } => base
            .fix("Check the server is reachable and the user may CREATE DATABASE")
            .fix("Check that psql is on PATH if the failure is in the import"),
        LifecycleError::Tables { .. } => {
            base.fix("List the tables explicitly with --table or [harness].tables")
        }
        LifecycleError::Triggers { .. } => base
            .fix("Make sure every listed table exists in the source schema")
            .fix("Omit --table to disable triggers on every discovered table"),
        LifecycleError::Teardown { .. } => {
            base.fix("Check that no other session is still connected to the database")
        }
    };

    if err.leaves_database_behind() {
        base.suggest("pgscratch cleanup")
    } else {
        base
    }
}

pub fn schema_file_unreadable(path: &Path, err: &std::io::Error) -> UxError {
    UxError::new(format!("Could not read schema file '{}'", path.display()))
        .why(err.to_string())
        .fix("Point --schema-file at a plain SQL file")
        .fix("Or drop --schema-file to copy the schema with pg_dump and psql")
}

pub fn cleanup_failed(source: &str, err: &SqlError) -> UxError {
    UxError::new(format!("Cleanup of leftover databases for '{}' failed", source))
        .why(err.to_string())
        .fix("Check that the administrative database is reachable")
        .fix("Close any session still connected to the leftover databases")
        .suggest("pgscratch cleanup --dry-run")
}

pub fn cleanup_incomplete(source: &str, failed: &[(String, SqlError)]) -> UxError {
    let names: Vec<&str> = failed.iter().map(|(name, _)| name.as_str()).collect();
    let mut err = UxError::new(format!(
        "Could not drop {} leftover database(s) for '{}': {}",
        failed.len(),
        source,
        names.join(", ")
    ))
    .fix("A run may still be using them; retry once it has finished")
    .suggest("pgscratch cleanup");

    if let Some((_, first)) = failed.first() {
        err = err.why(first.to_string());
    }
    err
}
