//! # Configuration File Loading
//!
//! Loads configuration from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension.

use crate::config::HarnessConfig;
use errors::ConfigError;
use std::path::Path;

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound {
            path: path.display().to_string()
        },
        _ => ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string()
        }
    })
}

/// Load configuration from TOML file.
///
/// ## Error Handling
/// Returns `ConfigError` for:
/// - File not found (`NotFound`)
/// - Invalid TOML syntax or missing required fields (`Malformed`)
pub fn load_from_toml(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let contents = read_config(path)?;

    toml::from_str(&contents).map_err(|e| ConfigError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string()
    })
}

/// Load configuration from YAML file.
///
/// ## Error Handling
/// Returns `ConfigError` for:
/// - File not found (`NotFound`)
/// - Invalid YAML syntax or missing required fields (`Malformed`)
pub fn load_from_yaml(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let contents = read_config(path)?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string()
    })
}

/// Load configuration from file with auto-detection.
///
/// # M-CANONICAL-DOCS
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml`: YAML format
/// - `.yml`: YAML format
///
/// ## Error Handling
/// A missing file is reported as `NotFound` before the extension is looked
/// at, so a typo in the path never masquerades as a format problem.
pub fn load_from_file(path: &Path) -> Result<HarnessConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.display().to_string()
        });
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: "config file has no extension".to_string()
        })?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigError::Malformed {
            path: path.display().to_string(),
            reason: format!("unsupported config file format: {}", other)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.toml");

        let toml_content = r#"
[postgres]
user = "t"
pass = "t"
host = "localhost"
port = 5432
dbname = "app"

[harness]
strict = true
tables = ["users", "videos"]
"#;
        fs::write(&path, toml_content).unwrap();

        let config = load_from_toml(&path).unwrap();
        assert_eq!(config.postgres.user, "t");
        assert_eq!(config.postgres.pass, "t");
        assert_eq!(config.postgres.host, "localhost");
        assert_eq!(config.postgres.port, 5432);
        assert_eq!(config.postgres.dbname, "app");
        assert_eq!(config.postgres.admin_dbname, "template1");
        assert!(config.harness.strict);
        assert_eq!(config.harness.tables, vec!["users", "videos"]);
    }

    #[test]
    fn test_load_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.yaml");

        let yaml_content = r#"
postgres:
  user: t
  pass: t
  host: db.internal
  port: 6543
  dbname: app
"#;
        fs::write(&path, yaml_content).unwrap();

        let config = load_from_yaml(&path).unwrap();
        assert_eq!(config.postgres.host, "db.internal");
        assert_eq!(config.postgres.port, 6543);
        assert!(!config.harness.strict);
        assert_eq!(config.harness.dump_tool, "pg_dump");
    }

    #[test]
    fn test_load_from_file_detects_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.yml");
        fs::write(&path, "postgres:\n  user: t\n  dbname: app\n").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.postgres.dbname, "app");
        assert_eq!(config.postgres.port, 5432);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_missing_file_without_extension_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_from_file(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_toml_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.toml");
        fs::write(&path, "[postgres\nuser = ").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_missing_postgres_section_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.toml");
        fs::write(&path, "[harness]\nstrict = true\n").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_unsupported_extension_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pgscratch.ini");
        fs::write(&path, "user=t").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
