//! Assertion records.

use std::fmt;

use thiserror::Error;

/// One assertion outcome, appended to the history in call order.
#[derive(Debug, Clone)]
pub enum Record {
    Success(Success),
    Failure(AssertionFailure),
}

impl Record {
    pub fn is_success(&self) -> bool {
        matches!(self, Record::Success(_))
    }

    /// Short description of what was asserted.
    pub fn assertion(&self) -> &str {
        match self {
            Record::Success(s) => &s.assertion,
            Record::Failure(f) => &f.assertion,
        }
    }

    /// User-provided context, empty when none was given.
    pub fn context(&self) -> &str {
        match self {
            Record::Success(s) => &s.context,
            Record::Failure(f) => &f.context,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.assertion())
    }
}

/// A passed assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    /// What was asserted, e.g. "Same: 42".
    pub assertion: String,
    pub context: String,
}

impl Success {
    pub fn new(assertion: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            assertion: assertion.into(),
            context: context.into(),
        }
    }
}

/// Category of a failed assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An expected-vs-actual comparison did not hold.
    Comparison,
    /// Raised explicitly through [`fail`](crate::assert::fail).
    Fail,
    /// A declared expectation was not met.
    ExpectationMismatch,
    /// A tracked object outlived its test.
    Leak,
}

/// A failed assertion.
///
/// Returned by the assertion helpers so a test body can propagate it with `?`.
#[derive(Debug, Clone, Error)]
#[error("{assertion}")]
pub struct AssertionFailure {
    /// The assertion result, e.g. "Expected `42`, got `43`.".
    pub assertion: String,
    pub context: String,
    /// Extra details such as a diff; empty when there are none.
    pub details: String,
    pub kind: FailureKind,
}

impl AssertionFailure {
    pub fn new(kind: FailureKind, assertion: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            assertion: assertion.into(),
            context: context.into(),
            details: String::new(),
            kind,
        }
    }

    pub fn comparison(expected: impl fmt::Debug, actual: impl fmt::Debug, context: &str) -> Self {
        Self::new(
            FailureKind::Comparison,
            format!("Expected `{expected:?}`, got `{actual:?}`."),
            context,
        )
    }

    pub fn mismatch(assertion: impl Into<String>) -> Self {
        Self::new(FailureKind::ExpectationMismatch, assertion, "")
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Assertion history of one attempt, attached to its result.
#[derive(Debug, Clone, Default)]
pub struct AssertionHistory {
    records: Vec<Record>,
}

impl AssertionHistory {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionFailure> {
        self.records.iter().filter_map(|r| match r {
            Record::Failure(f) => Some(f),
            Record::Success(_) => None,
        })
    }
}
