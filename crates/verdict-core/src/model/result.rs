use std::any::Any;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::attributes::Attributes;
use super::definition::SuiteInfo;
use super::info::{CaseInfo, TestInfo};
use crate::assert::{AssertionHistory, Record};
use crate::failure::Failure;
use crate::status::Status;

/// Outcome of one test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub info: TestInfo,
    pub status: Status,
    /// Raw value returned by the test body.
    pub value: Value,
    pub failure: Option<Failure>,
    pub attributes: Attributes,
}

impl TestResult {
    pub fn new(info: TestInfo, status: Status) -> Self {
        Self {
            info,
            status,
            value: Value::Null,
            failure: None,
            attributes: Attributes::new(),
        }
    }

    /// Returns a copy with another status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Returns a copy with the given failure attached.
    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_attribute<T>(mut self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.attributes = self.attributes.with(value);
        self
    }

    pub fn attribute<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.attributes.get::<T>()
    }

    /// Assertion records collected while the test ran.
    pub fn history(&self) -> &[Record] {
        self.attribute::<AssertionHistory>()
            .map(|h| h.records())
            .unwrap_or(&[])
    }
}

/// Outcome of one case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub info: CaseInfo,
    pub results: Vec<TestResult>,
    pub status: Status,
    /// Set when the case failed as a whole (e.g. its instance could not be built).
    pub failure: Option<Failure>,
    pub attributes: Attributes,
}

impl CaseResult {
    /// Builds a result and aggregates the status from the children.
    pub fn from_results(info: CaseInfo, results: Vec<TestResult>) -> Self {
        let status = Status::aggregate(results.iter().map(|r| r.status));
        Self {
            info,
            results,
            status,
            failure: None,
            attributes: Attributes::new(),
        }
    }

    /// A case that failed before any of its tests could run.
    pub fn failed(info: CaseInfo, status: Status, failure: Failure) -> Self {
        Self {
            info,
            results: Vec::new(),
            status,
            failure: Some(failure),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute<T>(mut self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.attributes = self.attributes.with(value);
        self
    }

    /// Number of tests with the given status.
    pub fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Number of tests that count as failures.
    pub fn count_failed(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failure()).count()
    }
}

/// Outcome of one suite.
#[derive(Debug, Clone)]
pub struct SuiteResult {
    pub info: SuiteInfo,
    pub results: Vec<CaseResult>,
    pub status: Status,
    pub failure: Option<Failure>,
}

impl SuiteResult {
    pub fn from_results(info: SuiteInfo, results: Vec<CaseResult>) -> Self {
        let status = Status::aggregate(results.iter().map(|r| r.status));
        Self {
            info,
            results,
            status,
            failure: None,
        }
    }

    pub fn failed(info: SuiteInfo, status: Status, failure: Failure) -> Self {
        Self {
            info,
            results: Vec::new(),
            status,
            failure: Some(failure),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Test results across all cases, in execution order.
    pub fn tests(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().flat_map(|c| c.results.iter())
    }

    pub fn count_failed(&self) -> usize {
        self.results.iter().map(|c| c.count_failed()).sum()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<SuiteResult>,
    pub status: Status,
}

impl RunResult {
    /// Counts tests per status.
    ///
    /// Data-provider sub-results are not expanded: a fanned-out test counts
    /// once, with its aggregated status.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for suite in &self.results {
            for case in &suite.results {
                if case.results.is_empty() && case.status.is_failure() {
                    summary.broken_cases += 1;
                }
                for test in &case.results {
                    summary.record(test.status);
                }
            }
        }
        summary
    }
}

/// Per-status test counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub error: usize,
    pub risky: usize,
    pub flaky: usize,
    pub cancelled: usize,
    pub aborted: usize,
    /// Cases that failed before running any test.
    pub broken_cases: usize,
}

impl Summary {
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        let slot = match status {
            Status::Passed => &mut self.passed,
            Status::Failed => &mut self.failed,
            Status::Skipped => &mut self.skipped,
            Status::Error => &mut self.error,
            Status::Risky => &mut self.risky,
            Status::Flaky => &mut self.flaky,
            Status::Cancelled => &mut self.cancelled,
            Status::Aborted => &mut self.aborted,
        };
        *slot += 1;
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Passed => self.passed,
            Status::Failed => self.failed,
            Status::Skipped => self.skipped,
            Status::Error => self.error,
            Status::Risky => self.risky,
            Status::Flaky => self.flaky,
            Status::Cancelled => self.cancelled,
            Status::Aborted => self.aborted,
        }
    }
}
