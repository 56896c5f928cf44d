//! # Configuration System
//!
//! Configuration loading for the ephemeral database harness.
//!
//! This crate provides:
//! - Configuration structures for the source database and the harness
//! - Configuration file loading (TOML/YAML)
//! - Environment variable overrides
//! - Configuration validation
//!
//! [`load`] is the single entry point the harness uses: file, then
//! environment, then validation.

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod validation;

use std::path::Path;

pub use config::{ConnectionConfig, HarnessConfig, HarnessSettings};
pub use errors::ConfigError;
pub use file_loader::{load_from_file, load_from_toml, load_from_yaml};
pub use loader::apply_env_overrides;
pub use validation::validate;

/// Load, override and validate the harness configuration.
///
/// ## Error Handling
/// - `ConfigError::NotFound` when the file is absent
/// - `ConfigError::Malformed` when decoding fails
/// - `ConfigError::Invalid` when a field is out of range
pub fn load(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let mut config = load_from_file(path)?;
    apply_env_overrides(&mut config)?;
    validate(&config)?;

    tracing::debug!(
        path = %path.display(),
        host = %config.postgres.host,
        port = config.postgres.port,
        database = %config.postgres.dbname,
        strict = config.harness.strict,
        "Loaded harness configuration"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::clear_env;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_rejects_out_of_range_values() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.toml");
        std::fs::write(
            &path,
            "[postgres]\nuser = \"t\"\ndbname = \"app\"\nport = 0\n"
        )
        .unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    #[serial]
    fn test_load_end_to_end() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.toml");
        std::fs::write(
            &path,
            "[postgres]\nuser = \"t\"\npass = \"t\"\nhost = \"localhost\"\nport = 5432\ndbname = \"app\"\n"
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.postgres.dbname, "app");
        assert_eq!(config.harness, HarnessSettings::default());
    }
}
