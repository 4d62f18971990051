//! Expectations evaluated against an attempt's final outcome.

use std::error::Error as StdError;
use std::fmt;

use super::record::{AssertionFailure, Record, Success};
use crate::failure::{short_type_name, Failure};
use crate::model::TestResult;
use crate::status::Status;

/// A pending check on how the attempt ends.
#[derive(Debug, Clone)]
pub enum Expectation {
    Exception(ExpectedException),
    Failure(ExpectedFailure),
}

impl Expectation {
    /// Compares the outcome with this expectation.
    ///
    /// Returns the rewritten result and the record describing the check.
    pub fn evaluate(&self, result: TestResult) -> (TestResult, Record) {
        let verdict = match self {
            Expectation::Exception(expected) => expected.check(result.failure.as_ref()),
            Expectation::Failure(expected) => expected.check(result.failure.as_ref()),
        };

        match verdict {
            Ok(success) => (result.with_status(Status::Passed), Record::Success(success)),
            Err(mismatch) => {
                let failure = Failure::new(mismatch.clone());
                (
                    result.with_status(Status::Failed).with_failure(failure),
                    Record::Failure(mismatch),
                )
            }
        }
    }
}

/// "The test must end with this error".
#[derive(Clone)]
pub enum ExpectedException {
    /// Any error of the given type.
    Type {
        name: &'static str,
        matches: fn(&Failure) -> bool,
    },
    /// Exactly this captured error.
    Instance(Failure),
}

fn is_a<E>(failure: &Failure) -> bool
where
    E: StdError + 'static,
{
    failure.is::<E>()
}

impl ExpectedException {
    pub fn of<E>() -> Self
    where
        E: StdError + 'static,
    {
        ExpectedException::Type {
            name: std::any::type_name::<E>(),
            matches: is_a::<E>,
        }
    }

    pub fn instance(failure: Failure) -> Self {
        ExpectedException::Instance(failure)
    }

    /// Short name of the expected type.
    pub fn expected_name(&self) -> &'static str {
        match self {
            ExpectedException::Type { name, .. } => short_type_name(*name),
            ExpectedException::Instance(failure) => failure.short_type_name(),
        }
    }

    fn check(&self, actual: Option<&Failure>) -> Result<Success, AssertionFailure> {
        let expected = self.expected_name();
        let matched = actual.is_some_and(|actual| match self {
            ExpectedException::Type { matches, .. } => matches(actual),
            ExpectedException::Instance(instance) => instance.same(actual),
        });

        match actual {
            Some(actual) if matched => {
                let got = actual.short_type_name();
                Ok(Success::new(
                    if got == expected {
                        format!("Throw exception: `{expected}`.")
                    } else {
                        format!("Throw exception: `{expected}` (got `{got}`).")
                    },
                    "",
                ))
            }
            Some(actual) => Err(AssertionFailure::mismatch(format!(
                "Expected exception of type `{expected}`, got `{}`.",
                actual.short_type_name()
            ))
            .with_details(actual.to_string())),
            None => Err(AssertionFailure::mismatch(format!(
                "Expected exception of type `{expected}`, none thrown."
            ))),
        }
    }
}

impl fmt::Debug for ExpectedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedException::Type { name, .. } => f.debug_tuple("Type").field(name).finish(),
            ExpectedException::Instance(failure) => {
                f.debug_tuple("Instance").field(failure).finish()
            }
        }
    }
}

/// "The test must fail", optionally with a given assertion message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedFailure {
    /// `None` accepts any assertion failure.
    pub message: Option<String>,
}

impl ExpectedFailure {
    pub fn new(message: Option<String>) -> Self {
        Self { message }
    }

    fn check(&self, actual: Option<&Failure>) -> Result<Success, AssertionFailure> {
        let Some(actual) = actual else {
            return Err(AssertionFailure::mismatch(
                "Expected test to fail, but it passed",
            ));
        };
        let Some(assertion) = actual.downcast_ref::<AssertionFailure>() else {
            return Err(AssertionFailure::mismatch(format!(
                "Expected assertion failure, but got `{}`",
                actual.short_type_name()
            )));
        };

        match &self.message {
            None => Ok(Success::new("Test failed as expected", "")),
            Some(message) if *message == assertion.assertion => Ok(Success::new(
                format!("Test failed with expected message: `{message}`"),
                "",
            )),
            Some(message) => Err(AssertionFailure::mismatch(format!(
                "Expected failure message: `{message}`, but got: `{}`",
                assertion.assertion
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::Fault;

    #[test]
    fn test_expected_type_matches_by_downcast() {
        let expected = ExpectedException::of::<Fault>();
        let actual = Failure::msg("boom");
        assert!(expected.check(Some(&actual)).is_ok());
        assert!(expected.check(None).is_err());
    }

    #[test]
    fn test_expected_instance_matches_by_identity() {
        let declared = Failure::msg("boom");
        let expected = ExpectedException::instance(declared.clone());
        assert!(expected.check(Some(&declared)).is_ok());
        assert!(expected.check(Some(&Failure::msg("boom"))).is_err());
    }

    #[test]
    fn test_expected_failure_messages() {
        let thrown = Failure::new(AssertionFailure::comparison(1, 2, ""));
        assert!(ExpectedFailure::new(None).check(Some(&thrown)).is_ok());

        let wrong = ExpectedFailure::new(Some("other".into()))
            .check(Some(&thrown))
            .err();
        assert_eq!(
            wrong.map(|f| f.assertion),
            Some("Expected failure message: `other`, but got: `Expected `1`, got `2`.`".to_string())
        );

        let passed = ExpectedFailure::new(None).check(None).err();
        assert_eq!(
            passed.map(|f| f.assertion),
            Some("Expected test to fail, but it passed".to_string())
        );
    }
}
