//! Transient password files for external Postgres tools.
//!
//! Each [`CredentialFile`] lives in its own temporary directory. Dropping it
//! removes the directory and the file with it, on every exit path.

use config::ConnectionConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zeroize::Zeroizing;

/// Environment variable libpq tools read the password file location from.
pub const PASSFILE_ENV: &str = "PGPASSFILE";

/// An owner-only `host:port:dbname:user:pass` file for one connection target.
#[derive(Debug)]
pub struct CredentialFile {
    dir: TempDir,
    path: PathBuf
}

impl CredentialFile {
    /// Write the password file for `cfg` into a fresh temporary directory.
    pub fn create(cfg: &ConnectionConfig) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("pgscratch-").tempdir()?;
        let path = dir.path().join("pgpass");

        let line = Zeroizing::new(passfile_line(cfg));
        let mut file = open_owner_only(&path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// One pgpass line; `\` and `:` inside fields are backslash-escaped.
pub fn passfile_line(cfg: &ConnectionConfig) -> String {
    format!(
        "{}:{}:{}:{}:{}\n",
        escape_field(&cfg.host),
        cfg.port,
        escape_field(&cfg.dbname),
        escape_field(&cfg.user),
        escape_field(&cfg.pass)
    )
}

fn escape_field(value: &str) -> String {
    value.replace('\\', "\\\\").replace(':', "\\:")
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
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
            sslmode: "prefer".to_string(),
            admin_dbname: "template1".to_string()
        }
    }

    #[test]
    fn test_passfile_line_format() {
        assert_eq!(passfile_line(&sample()), "localhost:5432:app:t:t\n");
    }

    #[test]
    fn test_passfile_line_escapes_separators() {
        let mut cfg = sample();
        cfg.pass = "a:b\\c".to_string();
        assert_eq!(passfile_line(&cfg), "localhost:5432:app:t:a\\:b\\\\c\n");
    }

    #[test]
    fn test_create_writes_file_and_drop_removes_directory() {
        let credentials = CredentialFile::create(&sample()).unwrap();
        let dir = credentials.dir().to_path_buf();
        let contents = std::fs::read_to_string(credentials.path()).unwrap();
        assert_eq!(contents, "localhost:5432:app:t:t\n");

        drop(credentials);
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let credentials = CredentialFile::create(&sample()).unwrap();
        let mode = std::fs::metadata(credentials.path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_separate_targets_get_separate_files() {
        let source = CredentialFile::create(&sample()).unwrap();
        let ephemeral = CredentialFile::create(&sample().with_dbname("app_0123456789abcdef")).unwrap();
        assert_ne!(source.path(), ephemeral.path());
        let contents = std::fs::read_to_string(ephemeral.path()).unwrap();
        assert!(contents.contains(":app_0123456789abcdef:"));
    }
}
