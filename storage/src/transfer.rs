//! Schema transfer: dumping the source schema and importing it into the
//! ephemeral database.
//!
//! [`PgTools`] spawns `pg_dump` and `psql`. [`SqlScript`] does the same job
//! in-process from a fixed DDL script, for environments that cannot spawn
//! the Postgres client tools.

use crate::connector::DatabaseHandle;
use crate::credentials::{CredentialFile, PASSFILE_ENV};
use async_trait::async_trait;
use config::{ConnectionConfig, HarnessSettings};
use errors::{ExportError, ImportError};
use std::path::Path;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;

/// Temporary file holding the exported DDL. Removed on drop.
#[derive(Debug)]
pub struct SchemaDumpFile {
    file: NamedTempFile
}

impl SchemaDumpFile {
    pub fn new() -> std::io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("pgscratch-schema-")
            .suffix(".sql")
            .tempfile()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn contents(&self) -> std::io::Result<String> {
        std::fs::read_to_string(self.path())
    }

    pub fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.file.as_file().metadata()?.len() == 0)
    }

    fn writer(&self) -> std::io::Result<std::fs::File> {
        self.file.reopen()
    }
}

/// What to do when a dump or import fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferPolicy {
    /// Log the failure and carry on; a later stage surfaces the damage.
    #[default]
    Lenient,
    /// Abort provisioning.
    Strict
}

impl TransferPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }

    /// Apply the policy to the result of one transfer step.
    pub fn settle<E>(self, step: &str, result: Result<(), E>) -> Result<(), E>
    where
        E: std::fmt::Display
    {
        match (self, result) {
            (_, Ok(())) => Ok(()),
            (Self::Lenient, Err(e)) => {
                tracing::warn!(step, error = %e, "Schema {} failed, continuing", step);
                Ok(())
            }
            (Self::Strict, Err(e)) => Err(e)
        }
    }
}

/// Moves a schema from one database into another.
#[async_trait]
pub trait SchemaTransfer: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Export the schema of `source` into `out`.
    async fn dump(&self, source: &ConnectionConfig, out: &SchemaDumpFile)
    -> Result<(), ExportError>;

    /// Import `dump` into `target`; `handle` is the open connection to it.
    async fn import(
        &self,
        target: &ConnectionConfig,
        handle: &mut DatabaseHandle,
        dump: &SchemaDumpFile
    ) -> Result<(), ImportError>;
}

/// Schema transfer through the Postgres client tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgTools {
    pub dump_tool: String,
    pub import_tool: String
}

impl Default for PgTools {
    fn default() -> Self {
        Self {
            dump_tool: "pg_dump".to_string(),
            import_tool: "psql".to_string()
        }
    }
}

impl PgTools {
    pub fn from_settings(settings: &HarnessSettings) -> Self {
        Self {
            dump_tool: settings.dump_tool.clone(),
            import_tool: settings.import_tool.clone()
        }
    }

    pub fn dump_args(source: &ConnectionConfig) -> Vec<String> {
        vec![
            format!("--host={}", source.host),
            format!("--port={}", source.port),
            format!("--username={}", source.user),
            "--schema-only".to_string(),
            source.dbname.clone(),
        ]
    }

    pub fn import_args(target: &ConnectionConfig, dump: &Path) -> Vec<String> {
        vec![
            format!("--dbname={}", target.dbname),
            format!("--host={}", target.host),
            format!("--port={}", target.port),
            format!("--username={}", target.user),
            format!("--file={}", dump.display()),
        ]
    }
}

#[async_trait]
impl SchemaTransfer for PgTools {
    fn name(&self) -> &str {
        "pg-tools"
    }

    async fn dump(
        &self,
        source: &ConnectionConfig,
        out: &SchemaDumpFile
    ) -> Result<(), ExportError> {
        let credentials = CredentialFile::create(source).map_err(|e| ExportError::Io {
            reason: format!("writing credential file: {}", e)
        })?;
        let stdout = out.writer().map_err(|e| ExportError::Io {
            reason: format!("opening dump file: {}", e)
        })?;

        tracing::info!(tool = %self.dump_tool, database = %source.dbname, "Dumping schema");

        // `output()` would replace the file stdout with a pipe.
        let child = Command::new(&self.dump_tool)
            .args(Self::dump_args(source))
            .env(PASSFILE_ENV, credentials.path())
            .env("PGSSLMODE", &source.sslmode)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExportError::Spawn {
                tool: self.dump_tool.clone(),
                reason: e.to_string()
            })?;
        let output = child.wait_with_output().await.map_err(|e| ExportError::Io {
            reason: format!("waiting for {}: {}", self.dump_tool, e)
        })?;

        if !output.status.success() {
            return Err(ExportError::ToolFailed {
                tool: self.dump_tool.clone(),
                database: source.dbname.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string()
            });
        }

        Ok(())
    }

    async fn import(
        &self,
        target: &ConnectionConfig,
        _handle: &mut DatabaseHandle,
        dump: &SchemaDumpFile
    ) -> Result<(), ImportError> {
        let credentials = CredentialFile::create(target).map_err(|e| ImportError::Io {
            reason: format!("writing credential file: {}", e)
        })?;

        tracing::info!(tool = %self.import_tool, database = %target.dbname, "Importing schema");

        let child = Command::new(&self.import_tool)
            .args(Self::import_args(target, dump.path()))
            .env(PASSFILE_ENV, credentials.path())
            .env("PGSSLMODE", &target.sslmode)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ImportError::Spawn {
                tool: self.import_tool.clone(),
                reason: e.to_string()
            })?;
        let output = child.wait_with_output().await.map_err(|e| ImportError::Io {
            reason: format!("waiting for {}: {}", self.import_tool, e)
        })?;

        if !output.status.success() {
            return Err(ImportError::ToolFailed {
                tool: self.import_tool.clone(),
                database: target.dbname.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string()
            });
        }

        Ok(())
    }
}

/// In-process schema transfer from a fixed DDL script.
///
/// `dump` writes the script to the dump file; `import` executes whatever the
/// dump file holds over the ephemeral database's own connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    ddl: String
}

impl SqlScript {
    pub fn new(ddl: impl Into<String>) -> Self {
        Self { ddl: ddl.into() }
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }
}

#[async_trait]
impl SchemaTransfer for SqlScript {
    fn name(&self) -> &str {
        "sql-script"
    }

    async fn dump(
        &self,
        source: &ConnectionConfig,
        out: &SchemaDumpFile
    ) -> Result<(), ExportError> {
        tracing::info!(database = %source.dbname, bytes = self.ddl.len(), "Writing schema script");

        tokio::fs::write(out.path(), self.ddl.as_bytes())
            .await
            .map_err(|e| ExportError::Io {
                reason: format!("writing dump file: {}", e)
            })
    }

    async fn import(
        &self,
        target: &ConnectionConfig,
        handle: &mut DatabaseHandle,
        dump: &SchemaDumpFile
    ) -> Result<(), ImportError> {
        let script = tokio::fs::read_to_string(dump.path())
            .await
            .map_err(|e| ImportError::Io {
                reason: format!("reading dump file: {}", e)
            })?;

        if script.trim().is_empty() {
            tracing::warn!(database = %target.dbname, "Schema script is empty, nothing to import");
            return Ok(());
        }

        handle
            .execute(&script)
            .await
            .map(|_| ())
            .map_err(|e| ImportError::Script {
                database: target.dbname.clone(),
                reason: e.to_string()
            })
    }
}
