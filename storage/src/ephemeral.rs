//! Ephemeral Database Manager.
//!
//! Provisioning runs strictly in this order, and only one connection is open
//! at any point:
//!
//! 1. derive the ephemeral name from the source name and a seed
//! 2. drop any stale database of that name via the administrative database
//! 3. connect to the source database and create the ephemeral database
//! 4. close that connection and connect to the ephemeral database
//! 5. import the dumped schema into it
//!
//! Nothing is rolled back on failure; a database created before a later
//! step fails stays on the server until [`cleanup_stale`] or the next run
//! with the same seed removes it.

use crate::connector::DatabaseHandle;
use crate::transfer::{SchemaDumpFile, SchemaTransfer, TransferPolicy};
use config::ConnectionConfig;
use errors::{ProvisionError, SqlError};
use utils::{derive_test_db_name, is_ephemeral_name_for, quote_ident};

/// A provisioned ephemeral database and the live handle bound to it.
#[derive(Debug)]
pub struct EphemeralDatabase {
    name: String,
    seed: u64,
    handle: DatabaseHandle
}

impl EphemeralDatabase {
    /// Provision end to end: [`EphemeralDatabase::create`] followed by
    /// [`EphemeralDatabase::import_schema`].
    pub async fn provision(
        cfg: &ConnectionConfig,
        dump: &SchemaDumpFile,
        transfer: &dyn SchemaTransfer,
        policy: TransferPolicy,
        seed: u64
    ) -> Result<Self, ProvisionError> {
        let mut db = Self::create(cfg, seed).await?;
        db.import_schema(cfg, dump, transfer, policy).await?;
        Ok(db)
    }

    /// Derive the name, drop any stale copy, create the database and open
    /// the handle bound to it.
    pub async fn create(cfg: &ConnectionConfig, seed: u64) -> Result<Self, ProvisionError> {
        let name = derive_test_db_name(&cfg.dbname, seed);
        tracing::info!(source = %cfg.dbname, database = %name, seed, "Provisioning ephemeral database");

        drop_if_exists(cfg, &name).await?;

        let mut creator = DatabaseHandle::connect(cfg).await?;
        let created = create_database(&mut creator, &name).await;
        creator.close().await?;
        created?;

        let handle = DatabaseHandle::connect(&cfg.with_dbname(&name)).await?;

        Ok(Self { name, seed, handle })
    }

    /// Import `dump` into this database. Under the strict policy a failure
    /// closes the handle and is returned; the database itself stays.
    pub async fn import_schema(
        &mut self,
        cfg: &ConnectionConfig,
        dump: &SchemaDumpFile,
        transfer: &dyn SchemaTransfer,
        policy: TransferPolicy
    ) -> Result<(), ProvisionError> {
        let target = self.config(cfg);
        let imported = transfer.import(&target, &mut self.handle, dump).await;
        if let Err(e) = policy.settle("import", imported) {
            self.handle.close().await.ok();
            return Err(e.into());
        }

        tracing::info!(database = %self.name, transfer = transfer.name(), "Imported schema");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn handle(&mut self) -> &mut DatabaseHandle {
        &mut self.handle
    }

    /// Connection parameters of the ephemeral database.
    pub fn config(&self, cfg: &ConnectionConfig) -> ConnectionConfig {
        cfg.with_dbname(&self.name)
    }

    /// Close the handle and drop the database.
    pub async fn teardown(mut self, cfg: &ConnectionConfig) -> Result<(), SqlError> {
        self.handle.close().await?;
        drop_if_exists(cfg, &self.name).await?;
        tracing::info!(database = %self.name, "Dropped ephemeral database");
        Ok(())
    }
}

/// Drop `name` if it exists, over a connection to the administrative
/// database. Succeeds when there is nothing to drop.
pub async fn drop_if_exists(cfg: &ConnectionConfig, name: &str) -> Result<(), SqlError> {
    let mut admin = DatabaseHandle::connect(&cfg.admin()).await?;
    let dropped = admin
        .execute(&format!("DROP DATABASE IF EXISTS {}", quote_ident(name)))
        .await;
    admin.close().await?;
    dropped?;

    tracing::debug!(database = %name, "Dropped database if it existed");
    Ok(())
}

pub async fn create_database(handle: &mut DatabaseHandle, name: &str) -> Result<(), SqlError> {
    handle
        .execute(&format!(
            "CREATE DATABASE {} WITH ENCODING 'UTF8'",
            quote_ident(name)
        ))
        .await?;

    tracing::debug!(database = %name, via = %handle.database(), "Created database");
    Ok(())
}

/// Base tables of every user schema, `public` ones unqualified, ordered by
/// schema then name.
///
/// Each part is written the way SQL expects it, double-quoted only when it
/// needs to be (`users`, `audit.events`, `"order.items"`), so the names can
/// be handed to [`crate::disable_all_triggers`] unchanged.
pub async fn list_tables(handle: &mut DatabaseHandle) -> Result<Vec<String>, SqlError> {
    handle
        .fetch_names(
            "SELECT CASE WHEN table_schema = 'public' THEN quote_ident(table_name) \
                    ELSE quote_ident(table_schema) || '.' || quote_ident(table_name) END \
             FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' \
               AND table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_schema, table_name"
        )
        .await
}

/// Databases on the server that look like ephemeral copies of
/// `cfg.dbname` left behind by earlier runs.
pub async fn list_ephemeral_databases(cfg: &ConnectionConfig) -> Result<Vec<String>, SqlError> {
    let mut admin = DatabaseHandle::connect(&cfg.admin()).await?;
    let names = admin
        .fetch_names("SELECT datname::text FROM pg_database WHERE NOT datistemplate ORDER BY datname")
        .await;
    admin.close().await?;

    Ok(names?
        .into_iter()
        .filter(|name| is_ephemeral_name_for(&cfg.dbname, name))
        .collect())
}

/// Result of [`cleanup_stale`]: what was dropped and what could not be.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub dropped: Vec<String>,
    pub failed: Vec<(String, SqlError)>
}

impl CleanupReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drop every leftover ephemeral database of `cfg.dbname`.
///
/// A database still in use by a live run cannot be dropped. Such failures
/// are logged and collected, and cleanup carries on with the rest. Only a
/// failure to list the candidates is returned as an error.
pub async fn cleanup_stale(cfg: &ConnectionConfig) -> Result<CleanupReport, SqlError> {
    let stale = list_ephemeral_databases(cfg).await?;
    let mut report = CleanupReport::default();

    for name in stale {
        tracing::info!(database = %name, "Dropping stale ephemeral database");
        match drop_if_exists(cfg, &name).await {
            Ok(()) => report.dropped.push(name),
            Err(e) => {
                tracing::warn!(database = %name, error = %e, "Could not drop stale ephemeral database");
                report.failed.push((name, e));
            }
        }
    }
    Ok(report)
}
