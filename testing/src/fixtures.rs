use config::{ConnectionConfig, HarnessConfig, HarnessSettings};
use std::sync::atomic::{AtomicU32, Ordering};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

pub const POSTGRES_USER: &str = "testuser";
pub const POSTGRES_PASSWORD: &str = "testpass";
pub const POSTGRES_DB: &str = "testdb";

/// Maintenance database used as the administrative database in tests.
///
/// Tests run in parallel, and `CREATE DATABASE` refuses to copy `template1`
/// while another session is connected to it.
pub const ADMIN_DB: &str = "postgres";

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Process-unique identifier-safe name, e.g. `src_3`.
pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}", prefix, id)
}

pub struct PostgresFixture {
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
    port: u16
}

impl PostgresFixture {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Superuser connection parameters for `dbname` on the fixture server.
    pub fn connection_config(&self, dbname: &str) -> ConnectionConfig {
        ConnectionConfig {
            user: POSTGRES_USER.to_string(),
            pass: POSTGRES_PASSWORD.to_string(),
            host: "localhost".to_string(),
            port: self.port,
            dbname: dbname.to_string(),
            sslmode: "disable".to_string(),
            admin_dbname: ADMIN_DB.to_string()
        }
    }

    /// Harness configuration whose source database is `dbname`.
    pub fn harness_config(&self, dbname: &str) -> HarnessConfig {
        HarnessConfig {
            postgres: self.connection_config(dbname),
            harness: HarnessSettings::default()
        }
    }

    /// Write a TOML config file for `dbname` into `dir` and return its path.
    pub fn write_config_file(
        &self,
        dir: &std::path::Path,
        dbname: &str
    ) -> std::io::Result<std::path::PathBuf> {
        let path = dir.join("pgscratch.toml");
        std::fs::write(
            &path,
            format!(
                "[postgres]\nuser = \"{}\"\npass = \"{}\"\nhost = \"localhost\"\nport = {}\ndbname = \"{}\"\nsslmode = \"disable\"\nadmin_dbname = \"{}\"\n",
                POSTGRES_USER, POSTGRES_PASSWORD, self.port, dbname, ADMIN_DB
            )
        )?;
        Ok(path)
    }
}

static POSTGRES: OnceCell<Option<PostgresFixture>> = OnceCell::const_new();

pub async fn postgres() -> Option<&'static PostgresFixture> {
    POSTGRES
        .get_or_init(|| async {
            let container_result = Postgres::default()
                .with_db_name(POSTGRES_DB)
                .with_user(POSTGRES_USER)
                .with_password(POSTGRES_PASSWORD)
                .start()
                .await;

            match container_result {
                Ok(container) => {
                    let port = container.get_host_port_ipv4(5432).await.ok()?;
                    tracing::info!("PostgreSQL fixture started on port {}", port);
                    Some(PostgresFixture { container, port })
                }
                Err(e) => {
                    tracing::warn!("Failed to start PostgreSQL container: {:?}", e);
                    None
                }
            }
        })
        .await
        .as_ref()
}

/// Whether both Postgres client tools can be spawned from `PATH`.
pub fn pg_tools_available() -> bool {
    ["pg_dump", "psql"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_generation() {
        let id1 = unique_id("src");
        let id2 = unique_id("src");
        assert_ne!(id1, id2);
        assert!(id1.starts_with("src_"));
        assert!(id2.starts_with("src_"));
    }
}
