//! # Configuration Validation
//!
//! Validates the merged configuration using the `validator` crate.

use crate::config::HarnessConfig;
use errors::ConfigError;
use validator::Validate;

/// Validate configuration structure.
///
/// ## Validation Rules
/// ### PostgreSQL
/// - `user`: non-empty, at most 63 bytes
/// - `host`: 1-255 characters
/// - `port`: 1-65535
/// - `dbname`: non-empty, at most 63 bytes
/// - `sslmode`: one of the libpq modes
/// - `admin_dbname`: non-empty, at most 63 bytes
///
/// ### Harness
/// - `dump_tool`, `import_tool`: non-empty
pub fn validate(config: &HarnessConfig) -> Result<(), ConfigError> {
    config.validate().map_err(|e| ConfigError::Invalid {
        reason: e.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, HarnessSettings};

    fn sample() -> HarnessConfig {
        HarnessConfig {
            postgres: ConnectionConfig {
                user: "t".to_string(),
                pass: String::new(),
                host: "localhost".to_string(),
                port: 5432,
                dbname: "app".to_string(),
                sslmode: "disable".to_string(),
                admin_dbname: "template1".to_string()
            },
            harness: HarnessSettings::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = sample();
        config.postgres.port = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = sample();
        config.postgres.host = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_dbname_too_long() {
        let mut config = sample();
        config.postgres.dbname = "x".repeat(64);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_dbname_limit_counts_bytes() {
        let mut config = sample();
        // 32 two-byte characters: 32 chars, 64 bytes.
        config.postgres.dbname = "é".repeat(32);
        assert!(matches!(validate(&config), Err(ConfigError::Invalid { .. })));

        config.postgres.dbname = format!("{}x", "é".repeat(31));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_admin_dbname_limit_counts_bytes() {
        let mut config = sample();
        config.postgres.admin_dbname = "ü".repeat(40);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_empty_dump_tool() {
        let mut config = sample();
        config.harness.dump_tool = String::new();
        assert!(validate(&config).is_err());
    }
}
