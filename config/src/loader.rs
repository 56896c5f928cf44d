//! # Environment Variable Overrides
//!
//! Applies environment variables on top of a file-loaded configuration, so CI
//! can point the harness at a different server without editing the file.
//!
//! # Naming Convention
//! - `PG_*`: Connection parameters for the source database
//! - `PGSCRATCH_*`: Harness behaviour

use crate::config::HarnessConfig;
use errors::ConfigError;
use std::env;

/// Apply environment overrides in place.
///
/// ## Environment Variables
/// ### PostgreSQL Settings (`PG_*`)
/// - `PG_HOST`: Database host
/// - `PG_PORT`: Database port
/// - `PG_USER`: Database user
/// - `PG_PASSWORD`: Database password
/// - `PG_DBNAME`: Source database name
///
/// ### Harness Settings (`PGSCRATCH_*`)
/// - `PGSCRATCH_STRICT`: Escalate dump/import failures (true/false)
/// - `PGSCRATCH_SEED`: Pin the ephemeral name seed
///
/// ## Error Handling
/// A variable that is set but does not parse is `ConfigError::Malformed`;
/// it is never silently ignored.
pub fn apply_env_overrides(config: &mut HarnessConfig) -> Result<(), ConfigError> {
    if let Ok(host) = env::var("PG_HOST") {
        config.postgres.host = host;
    }
    if let Some(port) = parse_env("PG_PORT")? {
        config.postgres.port = port;
    }
    if let Ok(user) = env::var("PG_USER") {
        config.postgres.user = user;
    }
    if let Ok(pass) = env::var("PG_PASSWORD") {
        config.postgres.pass = pass;
    }
    if let Ok(dbname) = env::var("PG_DBNAME") {
        config.postgres.dbname = dbname;
    }
    if let Some(strict) = parse_env("PGSCRATCH_STRICT")? {
        config.harness.strict = strict;
    }
    if let Some(seed) = parse_env("PGSCRATCH_SEED")? {
        config.harness.seed = Some(seed);
    }

    Ok(())
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display
{
    match env::var(key) {
        Ok(s) => s.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Malformed {
            path: format!("${}", key),
            reason: e.to_string()
        }),
        Err(_) => Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, HarnessSettings};
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "PG_HOST",
        "PG_PORT",
        "PG_USER",
        "PG_PASSWORD",
        "PG_DBNAME",
        "PGSCRATCH_STRICT",
        "PGSCRATCH_SEED"
    ];

    pub(crate) fn clear_env() {
        for key in KEYS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    fn sample() -> HarnessConfig {
        HarnessConfig {
            postgres: ConnectionConfig {
                user: "t".to_string(),
                pass: "t".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                dbname: "app".to_string(),
                sslmode: "prefer".to_string(),
                admin_dbname: "template1".to_string()
            },
            harness: HarnessSettings::default()
        }
    }

    #[test]
    #[serial]
    fn test_no_overrides_leaves_config_untouched() {
        clear_env();
        let mut config = sample();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config, sample());
    }

    #[test]
    #[serial]
    fn test_overrides_replace_file_values() {
        clear_env();
        unsafe {
            env::set_var("PG_HOST", "ci-postgres");
            env::set_var("PG_PORT", "6543");
            env::set_var("PGSCRATCH_STRICT", "true");
            env::set_var("PGSCRATCH_SEED", "42");
        }

        let mut config = sample();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.postgres.host, "ci-postgres");
        assert_eq!(config.postgres.port, 6543);
        assert!(config.harness.strict);
        assert_eq!(config.harness.seed, Some(42));
        assert_eq!(config.postgres.dbname, "app");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_override_is_malformed() {
        clear_env();
        unsafe {
            env::set_var("PG_PORT", "not-a-port");
        }

        let mut config = sample();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { ref path, .. } if path == "$PG_PORT"));

        clear_env();
    }
}
