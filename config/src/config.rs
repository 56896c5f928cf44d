//! # Configuration Structures
//!
//! Typed configuration for the ephemeral database harness.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Are immutable once [`crate::load`] returns them

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level harness configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates the connection parameters for the source database and the
/// settings that steer the harness itself.
///
/// ## Usage
/// ```rust,no_run
/// use config::HarnessConfig;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config: HarnessConfig = config::load(Path::new("pgscratch.toml"))?;
///     println!("Source database: {}", config.postgres.dbname);
///     Ok(())
/// }
/// ```
///
/// ## Fields
/// - `postgres`: Connection parameters for the source database (required)
/// - `harness`: Strictness, external tool names, seed and table list
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct HarnessConfig {
    /// Source database connection parameters
    #[validate(nested)]
    pub postgres: ConnectionConfig,

    /// Harness behaviour
    #[serde(default)]
    #[validate(nested)]
    pub harness: HarnessSettings
}

/// PostgreSQL connection parameters.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Identifies one database on one server. The same record, rebound with
/// [`ConnectionConfig::with_dbname`], addresses the administrative database
/// and the ephemeral database.
///
/// ## Fields
/// - `user`: Database user (required)
/// - `pass`: Database password (default: empty, for trust authentication)
/// - `host`: Database server hostname (default: "localhost")
/// - `port`: Database server port (default: 5432)
/// - `dbname`: Source database name (required, at most 63 bytes)
/// - `sslmode`: libpq-style SSL mode (default: "prefer")
/// - `admin_dbname`: Always-present database used to drop databases
///   (default: "template1")
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database username
    #[validate(length(min = 1), custom(function = "validate_identifier_bytes"))]
    pub user: String,

    /// Database password
    #[serde(default)]
    pub pass: String,

    /// Database server hostname
    #[serde(default = "default_host")]
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    /// Database server port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Database name
    #[validate(length(min = 1), custom(function = "validate_identifier_bytes"))]
    pub dbname: String,

    /// SSL negotiation mode
    #[serde(default = "default_sslmode")]
    #[validate(custom(function = "validate_sslmode"))]
    pub sslmode: String,

    /// Administrative database for DROP DATABASE
    #[serde(default = "default_admin_dbname")]
    #[validate(length(min = 1), custom(function = "validate_identifier_bytes"))]
    pub admin_dbname: String
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_sslmode() -> String {
    "prefer".to_string()
}

fn default_admin_dbname() -> String {
    "template1".to_string()
}

/// PostgreSQL truncates identifiers longer than 63 bytes.
const MAX_IDENTIFIER_BYTES: usize = 63;

fn validate_identifier_bytes(value: &str) -> Result<(), validator::ValidationError> {
    if value.len() > MAX_IDENTIFIER_BYTES {
        return Err(validator::ValidationError::new("Identifier longer than 63 bytes"));
    }
    Ok(())
}

fn validate_sslmode(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "disable" | "allow" | "prefer" | "require" | "verify-ca" | "verify-full" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid sslmode"))
    }
}

impl ConnectionConfig {
    /// Same server and credentials, bound to another database.
    pub fn with_dbname(&self, dbname: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            ..self.clone()
        }
    }

    /// The administrative database on the same server.
    pub fn admin(&self) -> Self {
        self.with_dbname(self.admin_dbname.clone())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .field("admin_dbname", &self.admin_dbname)
            .finish()
    }
}

/// Harness behaviour.
///
/// ## Fields
/// - `strict`: Escalate schema dump/import failures to fatal errors
///   (default: false)
/// - `dump_tool`: Schema dump executable (default: "pg_dump")
/// - `import_tool`: Schema import executable (default: "psql")
/// - `seed`: Pin the ephemeral name seed to reproduce a run (default: random)
/// - `tables`: Tables whose triggers are disabled (default: discovered from
///   the ephemeral database)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct HarnessSettings {
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_dump_tool")]
    #[validate(length(min = 1))]
    pub dump_tool: String,

    #[serde(default = "default_import_tool")]
    #[validate(length(min = 1))]
    pub import_tool: String,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub tables: Vec<String>
}

fn default_dump_tool() -> String {
    "pg_dump".to_string()
}

fn default_import_tool() -> String {
    "psql".to_string()
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            strict: false,
            dump_tool: default_dump_tool(),
            import_tool: default_import_tool(),
            seed: None,
            tables: Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConnectionConfig {
        ConnectionConfig {
            user: "t".to_string(),
            pass: "t".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            dbname: "app".to_string(),
            sslmode: default_sslmode(),
            admin_dbname: default_admin_dbname()
        }
    }

    #[test]
    fn test_with_dbname_keeps_credentials() {
        let cfg = sample();
        let other = cfg.with_dbname("app_deadbeef");
        assert_eq!(other.dbname, "app_deadbeef");
        assert_eq!(other.user, cfg.user);
        assert_eq!(other.pass, cfg.pass);
        assert_eq!(other.port, cfg.port);
        assert_eq!(cfg.dbname, "app");
    }

    #[test]
    fn test_admin_targets_template_database() {
        assert_eq!(sample().admin().dbname, "template1");
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut cfg = sample();
        cfg.pass = "hunter2".to_string();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_harness_settings_defaults() {
        let settings = HarnessSettings::default();
        assert!(!settings.strict);
        assert_eq!(settings.dump_tool, "pg_dump");
        assert_eq!(settings.import_tool, "psql");
        assert!(settings.seed.is_none());
        assert!(settings.tables.is_empty());
    }

    #[test]
    fn test_sslmode_validation() {
        let mut cfg = sample();
        assert!(cfg.validate().is_ok());
        cfg.sslmode = "sometimes".to_string();
        assert!(cfg.validate().is_err());
    }
}
