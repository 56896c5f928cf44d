use crate::stage::Stage;
use std::fmt;

/// Result of the test-suite callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteOutcome {
    Passed,
    Failed { code: i32 }
}

impl SuiteOutcome {
    /// Map a process exit status onto an outcome. A failing status of 0
    /// cannot happen, so `Failed` always carries a nonzero code.
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Self::Passed
        } else {
            Self::Failed { code }
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::Failed { code } => code
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for SuiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed { code } => write!(f, "failed with exit code {}", code)
        }
    }
}

/// Summary of a run that tore down its database and reached `Exit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: SuiteOutcome,
    pub database: String,
    pub seed: u64,
    pub final_stage: Stage
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_exit_code() {
        assert_eq!(SuiteOutcome::from_exit_code(0), SuiteOutcome::Passed);
        assert_eq!(
            SuiteOutcome::from_exit_code(101),
            SuiteOutcome::Failed { code: 101 }
        );
        assert!(!SuiteOutcome::from_exit_code(2).is_success());
    }

    #[test]
    fn test_report_exit_code_follows_suite() {
        let report = RunReport {
            outcome: SuiteOutcome::Failed { code: 4 },
            database: "app_0123456789abcdef".to_string(),
            seed: 7,
            final_stage: Stage::Exit
        };
        assert_eq!(report.exit_code(), 4);
    }
}
