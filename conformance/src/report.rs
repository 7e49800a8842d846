//! Audit results and the report that collects them.

use std::fmt;

use serde::Serialize;

/// Outcome class of one audit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule holds.
    Pass,
    /// Suspicious but not a rule violation.
    Warning,
    /// Rule violated; the snapshot does not conform.
    Failure,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Warning => "WARN",
            Self::Failure => "FAIL",
        })
    }
}

/// One check against a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Validator id, e.g. `registry/graph`.
    pub validator: String,
    /// One-line summary.
    pub message: String,
    /// Outcome class.
    pub severity: Severity,
    /// Offending items, one per line.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl TestResult {
    fn new(
        validator: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        details: Vec<String>,
    ) -> Self {
        Self {
            validator: validator.into(),
            message: message.into(),
            severity,
            details,
        }
    }

    /// A passed check.
    pub fn pass(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Pass, Vec::new())
    }

    /// A failed check.
    pub fn fail(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Failure, Vec::new())
    }

    /// A failed check listing what violated it.
    pub fn fail_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::new(validator, message, Severity::Failure, details)
    }

    /// A warning listing what triggered it.
    pub fn warn_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::new(validator, message, Severity::Warning, details)
    }

    /// Pass when `violations` is empty, otherwise a failure listing them.
    pub fn from_violations(
        validator: &str,
        passed: impl Into<String>,
        failed: impl Into<String>,
        violations: Vec<String>,
    ) -> Self {
        if violations.is_empty() {
            Self::pass(validator, passed)
        } else {
            Self::fail_with_details(validator, failed, violations)
        }
    }

    /// Whether this check blocks conformance.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.validator, self.message)?;
        for detail in &self.details {
            write!(f, "\n    - {detail}")?;
        }
        Ok(())
    }
}

/// Every check from one audit run, in validator order.
#[derive(Debug, Default, Serialize)]
pub struct ConformanceReport {
    /// Results in the order they were recorded.
    pub results: Vec<TestResult>,
}

impl ConformanceReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one result.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result)
    }

    /// Appends all results of `other`.
    pub fn extend(&mut self, other: ConformanceReport) {
        self.results.extend(other.results);
    }

    /// Number of failures.
    pub fn failure_count(&self) -> usize {
        self.count(Severity::Failure)
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.results.iter().filter(|r| r.severity == severity).count()
    }

    /// True when nothing failed. Warnings do not count.
    pub fn all_passed(&self) -> bool {
        !self.results.iter().any(TestResult::is_failure)
    }

    /// Results produced by one validator.
    pub fn by_validator<'a>(&'a self, validator: &'a str) -> impl Iterator<Item = &'a TestResult> {
        self.results.iter().filter(move |r| r.validator == validator)
    }

    /// One-line tally.
    pub fn summary(&self) -> String {
        format!(
            "{} checks: {} passed, {} warnings, {} failures",
            self.results.len(),
            self.results.len() - self.failure_count() - self.warning_count(),
            self.warning_count(),
            self.failure_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_summary() {
        let mut report = ConformanceReport::new();
        report.push(TestResult::pass("a", "ok"));
        report.push(TestResult::warn_with_details("a", "hm", vec!["x".into()]));
        report.push(TestResult::fail("b", "bad"));
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.all_passed());
        assert_eq!(report.by_validator("a").count(), 2);
        assert_eq!(report.summary(), "3 checks: 1 passed, 1 warnings, 1 failures");
    }

    #[test]
    fn display_lists_details() {
        let result = TestResult::fail_with_details("v", "broken", vec!["one".into()]);
        assert_eq!(result.to_string(), "[FAIL] v: broken\n    - one");
    }

    #[test]
    fn from_violations_picks_severity() {
        assert!(!TestResult::from_violations("v", "fine", "bad", vec![]).is_failure());
        assert!(TestResult::from_violations("v", "fine", "bad", vec!["x".into()]).is_failure());
    }
}
