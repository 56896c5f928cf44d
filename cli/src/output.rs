use colored::Colorize;
use lifecycle::SuiteOutcome;

pub fn info(msg: &str) {
    println!("{} {}", "info:".blue().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// One-line verdict on the test suite.
pub fn outcome(label: &str, outcome: SuiteOutcome) {
    let verdict = outcome.to_string();
    if outcome.is_success() {
        println!("{} {} {}", "✓".green().bold(), "tests".bold(), verdict.green());
    } else {
        println!("{} {} {}", "✗".red().bold(), "tests".bold(), verdict.red());
    }
    println!("  {}", label.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_does_not_panic() {
        info("This is info");
    }

    #[test]
    fn test_success_does_not_panic() {
        success("Dropped app_0123456789abcdef");
    }

    #[test]
    fn test_outcome_does_not_panic() {
        outcome("app_0123456789abcdef", SuiteOutcome::Passed);
        outcome("cargo test", SuiteOutcome::Failed { code: 101 });
    }
}
