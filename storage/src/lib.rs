//! # Storage Layer
//!
//! Everything that talks to PostgreSQL or to the Postgres client tools:
//! connections, credential files, schema transfer, ephemeral database
//! provisioning and trigger management.

pub mod connector;
pub mod credentials;
pub mod ephemeral;
pub mod transfer;
pub mod triggers;

pub use connector::{DatabaseHandle, connect_options, connection_url};
pub use credentials::CredentialFile;
pub use ephemeral::{
    CleanupReport, EphemeralDatabase, cleanup_stale, create_database, drop_if_exists, list_ephemeral_databases,
    list_tables,
};
pub use transfer::{PgTools, SchemaDumpFile, SchemaTransfer, SqlScript, TransferPolicy};
pub use triggers::{disable_all_triggers, enable_all_triggers};
