//! # pgscratch Lifecycle
//!
//! Sequences one harness run:
//!
//! `Start → ConfigLoaded → SourceSchemaDumped → EphemeralDbCreated →
//! SchemaImported → TriggersDisabled → TestsExecuting → TornDown → Exit`
//!
//! The test suite is an async callback handed a [`SuiteContext`] once the
//! ephemeral database is ready.

mod error;
mod orchestrator;
mod outcome;
mod stage;

pub use error::{FATAL_EXIT_CODE, LifecycleError};
pub use orchestrator::{Lifecycle, SuiteContext};
pub use outcome::{RunReport, SuiteOutcome};
pub use stage::Stage;
