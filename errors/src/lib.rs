//! # pgscratch Errors
//!
//! Error taxonomy for the ephemeral database harness.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields instead of positional ones
//! - Reasons are carried as strings; crates that talk to Postgres or spawn
//!   processes convert their native errors at the boundary

use thiserror::Error;

/// Config Loader errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: String },

    #[error("Malformed config file {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String }
}

impl ConfigError {
    /// Whether the config file was absent, as opposed to unreadable or malformed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Database connection errors
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection to {database} at {host}:{port} failed: {reason}")]
    Connect {
        database: String,
        host: String,
        port: u16,
        reason: String
    },

    #[error("Closing connection to {database} failed: {reason}")]
    Close { database: String, reason: String },

    #[error("Connection to {database} is already closed")]
    Closed { database: String }
}

/// Schema dump errors.
///
/// Downgraded to a warning unless the harness runs in strict mode.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to spawn {tool}: {reason}")]
    Spawn { tool: String, reason: String },

    #[error("{tool} exited with {status} while dumping {database}: {stderr}")]
    ToolFailed {
        tool: String,
        database: String,
        status: String,
        stderr: String
    },

    #[error("Schema dump I/O failed: {reason}")]
    Io { reason: String }
}

/// Schema import errors.
///
/// Downgraded to a warning unless the harness runs in strict mode.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to spawn {tool}: {reason}")]
    Spawn { tool: String, reason: String },

    #[error("{tool} exited with {status} while importing into {database}: {stderr}")]
    ToolFailed {
        tool: String,
        database: String,
        status: String,
        stderr: String
    },

    #[error("Executing schema script on {database} failed: {reason}")]
    Script { database: String, reason: String },

    #[error("Schema import I/O failed: {reason}")]
    Io { reason: String }
}

/// Errors from statements issued directly over a connection
#[derive(Debug, Error)]
pub enum SqlError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Statement `{statement}` on {database} failed: {reason}")]
    Statement {
        database: String,
        statement: String,
        reason: String
    },

    #[error("Disabling triggers on table {table} failed: {reason}")]
    TriggerDisable { table: String, reason: String },

    #[error("Enabling triggers on table {table} failed: {reason}")]
    TriggerEnable { table: String, reason: String }
}

/// Ephemeral database provisioning errors
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Import(#[from] ImportError)
}
