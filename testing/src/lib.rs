//! Shared test fixtures for the pgscratch workspace.
//!
//! Provides a single, shared PostgreSQL testcontainer per test process plus
//! helpers for tests that need the Postgres client tools.
//!
//! The fixture is lazily initialized once per test process and automatically
//! cleaned up when the process exits. Tests call [`postgres`] and return
//! early when it yields `None` (no Docker available).

mod fixtures;

pub use fixtures::*;
