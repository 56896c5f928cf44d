//! Lifecycle Orchestrator.
//!
//! Runs the stages of [`Stage`] strictly in order. Any failure before
//! [`Stage::TestsExecuting`] ends the run where it is and nothing is torn
//! down. Once the suite has started, teardown always follows it.

use crate::error::LifecycleError;
use crate::outcome::{RunReport, SuiteOutcome};
use crate::stage::Stage;
use config::{ConnectionConfig, HarnessConfig};
use errors::ConnectionError;
use std::path::Path;
use storage::{
    DatabaseHandle, EphemeralDatabase, PgTools, SchemaDumpFile, SchemaTransfer, TransferPolicy,
    connection_url, disable_all_triggers, list_tables
};
use utils::random_seed;

/// Everything the test suite gets to see of the ephemeral database.
#[derive(Debug)]
pub struct SuiteContext {
    database: EphemeralDatabase,
    config: ConnectionConfig,
    tables: Vec<String>
}

impl SuiteContext {
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    pub fn seed(&self) -> u64 {
        self.database.seed()
    }

    /// Live connection to the ephemeral database.
    pub fn handle(&mut self) -> &mut DatabaseHandle {
        self.database.handle()
    }

    /// Connection parameters of the ephemeral database.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Tables whose triggers were disabled.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn database_url(&self) -> Result<String, ConnectionError> {
        connection_url(&self.config)
    }
}

pub struct Lifecycle {
    config: HarnessConfig,
    transfer: Box<dyn SchemaTransfer>,
    stage: Stage
}

impl Lifecycle {
    pub fn new(config: HarnessConfig, transfer: impl SchemaTransfer + 'static) -> Self {
        let mut lifecycle = Self {
            config,
            transfer: Box::new(transfer),
            stage: Stage::Start
        };
        lifecycle.advance(Stage::ConfigLoaded);
        lifecycle
    }

    /// Lifecycle that moves the schema with the configured client tools.
    pub fn with_pg_tools(config: HarnessConfig) -> Self {
        let tools = PgTools::from_settings(&config.harness);
        Self::new(config, tools)
    }

    /// Config Loader stage followed by [`Lifecycle::new`].
    pub fn from_config_file(
        path: &Path,
        transfer: impl SchemaTransfer + 'static
    ) -> Result<Self, LifecycleError> {
        let config = config::load(path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "Configuration failed to load");
            LifecycleError::Config { source }
        })?;
        Ok(Self::new(config, transfer))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn policy(&self) -> TransferPolicy {
        TransferPolicy::from_strict(self.config.harness.strict)
    }

    fn advance(&mut self, to: Stage) {
        debug_assert_eq!(self.stage.next(), Some(to));
        tracing::info!(from = %self.stage, stage = %to, "Lifecycle stage reached");
        self.stage = to;
    }

    /// Provision the ephemeral database, hand it to `suite`, then tear it
    /// down.
    ///
    /// A failing suite is not an error: its outcome is in the report. A
    /// teardown failure is returned as [`LifecycleError::Teardown`] carrying
    /// the suite's outcome.
    pub async fn run<F>(mut self, suite: F) -> Result<RunReport, LifecycleError>
    where
        F: AsyncFnOnce(&mut SuiteContext) -> SuiteOutcome
    {
        let source_cfg = self.config.postgres.clone();
        let policy = self.policy();

        let dump = SchemaDumpFile::new().map_err(|e| LifecycleError::DumpFile {
            reason: e.to_string()
        })?;
        let dumped = self.transfer.dump(&source_cfg, &dump).await;
        policy
            .settle("dump", dumped)
            .map_err(|source| LifecycleError::Export { source })?;
        self.advance(Stage::SourceSchemaDumped);

        let seed = self.config.harness.seed.unwrap_or_else(random_seed);
        let mut database = EphemeralDatabase::create(&source_cfg, seed)
            .await
            .map_err(|source| LifecycleError::Provision {
                stage: Stage::EphemeralDbCreated,
                source
            })?;
        let name = database.name().to_string();
        self.advance(Stage::EphemeralDbCreated);

        database
            .import_schema(&source_cfg, &dump, self.transfer.as_ref(), policy)
            .await
            .map_err(|source| LifecycleError::Provision {
                stage: Stage::SchemaImported,
                source
            })?;
        self.advance(Stage::SchemaImported);

        let tables = if self.config.harness.tables.is_empty() {
            let discovered = list_tables(database.handle()).await;
            match discovered {
                Ok(tables) => tables,
                Err(source) => {
                    database.handle().close().await.ok();
                    return Err(LifecycleError::Tables {
                        database: name,
                        source
                    });
                }
            }
        } else {
            self.config.harness.tables.clone()
        };

        if let Err(source) = disable_all_triggers(database.handle(), &tables).await {
            tracing::error!(database = %name, error = %source, "Leaving ephemeral database in place");
            database.handle().close().await.ok();
            return Err(LifecycleError::Triggers {
                database: name,
                source
            });
        }
        self.advance(Stage::TriggersDisabled);

        self.advance(Stage::TestsExecuting);
        let mut ctx = SuiteContext {
            config: database.config(&source_cfg),
            database,
            tables
        };
        let outcome = suite(&mut ctx).await;
        tracing::info!(
            database = %name,
            exit_code = outcome.exit_code(),
            "Suite {}", outcome
        );

        if let Err(source) = ctx.database.teardown(&source_cfg).await {
            tracing::error!(database = %name, error = %source, "Teardown failed");
            return Err(LifecycleError::Teardown {
                database: name,
                outcome,
                source
            });
        }
        self.advance(Stage::TornDown);
        self.advance(Stage::Exit);

        Ok(RunReport {
            outcome,
            database: name,
            seed,
            final_stage: self.stage
        })
    }
}
