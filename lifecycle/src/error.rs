use crate::outcome::SuiteOutcome;
use crate::stage::Stage;
use errors::{ConfigError, ExportError, ProvisionError, SqlError};
use thiserror::Error;

/// Process exit status for any fatal stage failure.
pub const FATAL_EXIT_CODE: i32 = 1;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Loading configuration failed: {source}")]
    Config {
        #[source]
        source: ConfigError
    },

    #[error("Creating the schema dump file failed: {reason}")]
    DumpFile { reason: String },

    #[error("Dumping the source schema failed: {source}")]
    Export {
        #[source]
        source: ExportError
    },

    #[error("Provisioning failed before reaching {stage}: {source}")]
    Provision {
        stage: Stage,
        #[source]
        source: ProvisionError
    },

    #[error("Table discovery on {database} failed: {source}")]
    Tables {
        database: String,
        #[source]
        source: SqlError
    },

    #[error("Disabling triggers on {database} failed: {source}")]
    Triggers {
        database: String,
        #[source]
        source: SqlError
    },

    #[error("Teardown of {database} failed after the suite {outcome}: {source}")]
    Teardown {
        database: String,
        outcome: SuiteOutcome,
        #[source]
        source: SqlError
    }
}

impl LifecycleError {
    /// Last stage the run completed before failing.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config { .. } => Stage::Start,
            Self::DumpFile { .. } | Self::Export { .. } => Stage::ConfigLoaded,
            Self::Provision { stage, .. } => match stage {
                Stage::SchemaImported => Stage::EphemeralDbCreated,
                _ => Stage::SourceSchemaDumped
            },
            Self::Tables { .. } | Self::Triggers { .. } => Stage::SchemaImported,
            Self::Teardown { .. } => Stage::TestsExecuting
        }
    }

    /// Whether the ephemeral database may still exist on the server.
    pub fn leaves_database_behind(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. } | Self::DumpFile { .. } | Self::Export { .. }
        )
    }

    /// Outcome of the suite, when it got to run.
    pub fn suite_outcome(&self) -> Option<SuiteOutcome> {
        match self {
            Self::Teardown { outcome, .. } => Some(*outcome),
            _ => None
        }
    }

    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::ConnectionError;

    #[test]
    fn test_teardown_failure_still_reports_suite_outcome() {
        let err = LifecycleError::Teardown {
            database: "app_0123456789abcdef".to_string(),
            outcome: SuiteOutcome::Failed { code: 3 },
            source: SqlError::Statement {
                database: "postgres".to_string(),
                statement: "DROP DATABASE IF EXISTS \"app_0123456789abcdef\"".to_string(),
                reason: "database is being accessed by other users".to_string()
            }
        };
        assert_eq!(err.suite_outcome(), Some(SuiteOutcome::Failed { code: 3 }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.stage(), Stage::TestsExecuting);
        assert!(err.to_string().contains("failed with exit code 3"));
    }

    #[test]
    fn test_config_failure_touches_no_database() {
        let err = LifecycleError::Config {
            source: ConfigError::NotFound {
                path: "pgscratch.toml".to_string()
            }
        };
        assert_eq!(err.stage(), Stage::Start);
        assert!(!err.leaves_database_behind());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_provision_failure_stage() {
        let err = LifecycleError::Provision {
            stage: Stage::EphemeralDbCreated,
            source: ProvisionError::Connection(ConnectionError::Connect {
                database: "postgres".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                reason: "connection refused".to_string()
            })
        };
        assert_eq!(err.stage(), Stage::SourceSchemaDumped);
        assert!(err.leaves_database_behind());
    }
}
