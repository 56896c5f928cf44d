use std::fmt;

/// Linear lifecycle of one harness run. There are no back-edges: a run
/// either advances to the next stage or stops where it is. `Exit` is reached
/// when the run hands its report back to the caller, whose only remaining
/// step is to exit with the report's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    ConfigLoaded,
    SourceSchemaDumped,
    EphemeralDbCreated,
    SchemaImported,
    TriggersDisabled,
    TestsExecuting,
    TornDown,
    Exit
}

impl Stage {
    /// The stage that follows this one, `None` at `Exit`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::ConfigLoaded),
            Self::ConfigLoaded => Some(Self::SourceSchemaDumped),
            Self::SourceSchemaDumped => Some(Self::EphemeralDbCreated),
            Self::EphemeralDbCreated => Some(Self::SchemaImported),
            Self::SchemaImported => Some(Self::TriggersDisabled),
            Self::TriggersDisabled => Some(Self::TestsExecuting),
            Self::TestsExecuting => Some(Self::TornDown),
            Self::TornDown => Some(Self::Exit),
            Self::Exit => None
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ConfigLoaded => "config-loaded",
            Self::SourceSchemaDumped => "source-schema-dumped",
            Self::EphemeralDbCreated => "ephemeral-db-created",
            Self::SchemaImported => "schema-imported",
            Self::TriggersDisabled => "triggers-disabled",
            Self::TestsExecuting => "tests-executing",
            Self::TornDown => "torn-down",
            Self::Exit => "exit"
        };
        f.write_str(name)
    }
}
