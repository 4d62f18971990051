use serde::{Deserialize, Serialize};

/// Outcome of a test, case, suite or whole run.
///
/// `is_successful` and `is_failure` never hold at the same time, but they do
/// not cover every variant: Skipped, Cancelled, Risky and Aborted are neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Executed with all assertions passing.
    Passed,
    /// Failed due to an assertion failure or an unmet expectation.
    Failed,
    /// Not executed.
    Skipped,
    /// An unexpected fault escaped the test body.
    Error,
    /// Completed without failure but without any observed assertion.
    Risky,
    /// Completed successfully only after at least one failed attempt.
    Flaky,
    /// Stopped before completion.
    Cancelled,
    /// The execution harness itself failed, not the test body.
    Aborted,
}

impl Status {
    /// All variants, in declaration order.
    pub const ALL: [Status; 8] = [
        Status::Passed,
        Status::Failed,
        Status::Skipped,
        Status::Error,
        Status::Risky,
        Status::Flaky,
        Status::Cancelled,
        Status::Aborted,
    ];

    /// Returns true for outcomes that count as a pass.
    pub fn is_successful(&self) -> bool {
        matches!(self, Status::Passed | Status::Flaky)
    }

    /// Returns true for outcomes that count as a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failed | Status::Error)
    }

    /// Returns true when the body ran to its end without an observed failure.
    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Passed | Status::Flaky | Status::Risky)
    }

    /// Aggregates child statuses into a parent status.
    ///
    /// A parent is `Failed` as soon as one child is a failure, otherwise it
    /// is `Passed`. Flaky and Risky are test-level states and never bubble up.
    pub fn aggregate<I>(children: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        if children.into_iter().any(|s| s.is_failure()) {
            Status::Failed
        } else {
            Status::Passed
        }
    }

    /// Returns a human-readable name for the status.
    pub fn display_name(&self) -> &'static str {
        match self {
            Status::Passed => "Passed",
            Status::Failed => "Failed",
            Status::Skipped => "Skipped",
            Status::Error => "Error",
            Status::Risky => "Risky",
            Status::Flaky => "Flaky",
            Status::Cancelled => "Cancelled",
            Status::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
