//! Database Connector.
//!
//! A [`DatabaseHandle`] is one `PgConnection` bound to one database name.
//! Connecting is eager: an unreachable server, bad credentials or a missing
//! database fail in [`DatabaseHandle::connect`], never on first use.

use config::ConnectionConfig;
use errors::{ConnectionError, SqlError};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{AssertSqlSafe, Connection, PgConnection};

/// Build sqlx connect options from the five connection parameters.
pub fn connect_options(cfg: &ConnectionConfig) -> Result<PgConnectOptions, ConnectionError> {
    let ssl_mode: PgSslMode = cfg.sslmode.parse().map_err(|e: sqlx::Error| ConnectionError::Connect {
        database: cfg.dbname.clone(),
        host: cfg.host.clone(),
        port: cfg.port,
        reason: e.to_string()
    })?;

    Ok(PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.pass)
        .database(&cfg.dbname)
        .ssl_mode(ssl_mode))
}

/// `postgres://` URL for the same parameters, with user and password
/// percent-encoded. Handed to test processes as `DATABASE_URL`.
pub fn connection_url(cfg: &ConnectionConfig) -> Result<String, ConnectionError> {
    let invalid = |reason: String| ConnectionError::Connect {
        database: cfg.dbname.clone(),
        host: cfg.host.clone(),
        port: cfg.port,
        reason
    };

    let mut url = url::Url::parse(&format!("postgres://{}:{}/{}", cfg.host, cfg.port, cfg.dbname))
        .map_err(|e| invalid(e.to_string()))?;
    url.set_username(&cfg.user)
        .map_err(|()| invalid("username cannot be set on this URL".to_string()))?;
    if !cfg.pass.is_empty() {
        url.set_password(Some(&cfg.pass))
            .map_err(|()| invalid("password cannot be set on this URL".to_string()))?;
    }
    url.query_pairs_mut().append_pair("sslmode", &cfg.sslmode);

    Ok(url.into())
}

/// An open connection bound to exactly one database.
pub struct DatabaseHandle {
    conn: Option<PgConnection>,
    database: String
}

impl DatabaseHandle {
    pub async fn connect(cfg: &ConnectionConfig) -> Result<Self, ConnectionError> {
        let options = connect_options(cfg)?;
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| ConnectionError::Connect {
                database: cfg.dbname.clone(),
                host: cfg.host.clone(),
                port: cfg.port,
                reason: e.to_string()
            })?;

        tracing::debug!(database = %cfg.dbname, host = %cfg.host, port = cfg.port, "Connected");

        Ok(Self {
            conn: Some(conn),
            database: cfg.dbname.clone()
        })
    }

    #[cfg(test)]
    pub(crate) fn detached(database: &str) -> Self {
        Self {
            conn: None,
            database: database.to_string()
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Close the connection. Closing an already closed handle is a no-op.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        conn.close().await.map_err(|e| ConnectionError::Close {
            database: self.database.clone(),
            reason: e.to_string()
        })?;

        tracing::debug!(database = %self.database, "Closed connection");
        Ok(())
    }

    /// The live connection, for callers that run their own queries.
    pub fn connection(&mut self) -> Result<&mut PgConnection, ConnectionError> {
        self.conn.as_mut().ok_or_else(|| ConnectionError::Closed {
            database: self.database.clone()
        })
    }

    /// Run one or more statements over the simple query protocol.
    ///
    /// Utility statements such as `CREATE DATABASE` refuse to run inside the
    /// implicit transaction of a prepared statement, so nothing here is
    /// prepared.
    pub async fn execute(&mut self, sql: &str) -> Result<u64, SqlError> {
        let database = self.database.clone();
        let conn = self.connection()?;

        let result = sqlx::raw_sql(AssertSqlSafe(sql))
            .execute(&mut *conn)
            .await
            .map_err(|e| SqlError::Statement {
                database,
                statement: sql.to_string(),
                reason: e.to_string()
            })?;

        Ok(result.rows_affected())
    }

    /// Fetch the first column of every row of a static query.
    pub async fn fetch_names(&mut self, sql: &'static str) -> Result<Vec<String>, SqlError> {
        let database = self.database.clone();
        let conn = self.connection()?;

        let names: Vec<String> = sqlx::query_scalar(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| SqlError::Statement {
                database,
                statement: sql.to_string(),
                reason: e.to_string()
            })?;

        Ok(names)
    }
}

impl std::fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("database", &self.database)
            .field("open", &self.is_open())
            .finish()
    }
}
