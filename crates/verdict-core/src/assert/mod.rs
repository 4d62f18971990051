//! Assertion helpers and per-test assertion state.
//!
//! Every helper records exactly one [`Record`] into the current
//! [`AssertionContext`] and returns the failure so the body can propagate it
//! with `?`:
//!
//! ```ignore
//! assert::equals(4, 2 + 2, "sum")?;
//! ```
//!
//! Outside of a running test there is no current context; the helpers still
//! evaluate but record nothing.

mod context;
mod expectation;
mod record;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::Arc;

pub use context::{current, swap, AssertionContext, ContextScope};
pub use expectation::{Expectation, ExpectedException, ExpectedFailure};
pub use record::{AssertionFailure, AssertionHistory, FailureKind, Record, Success};

pub(crate) use context::Tracked;

use crate::failure::Failure;

fn check(
    passed: bool,
    success: impl FnOnce() -> String,
    failure: impl FnOnce() -> AssertionFailure,
    context: &str,
) -> Result<(), AssertionFailure> {
    let active = current();
    if passed {
        if let Some(active) = active {
            active.record(Record::Success(Success::new(success(), context)));
        }
        Ok(())
    } else {
        let failure = failure();
        if let Some(active) = active {
            active.record(Record::Failure(failure.clone()));
        }
        Err(failure)
    }
}

/// Asserts `actual == expected`.
pub fn equals<T>(expected: T, actual: T, context: &str) -> Result<(), AssertionFailure>
where
    T: PartialEq + Debug,
{
    check(
        actual == expected,
        || format!("Assert same: `{expected:?}`"),
        || AssertionFailure::comparison(&expected, &actual, context),
        context,
    )
}

/// Asserts `actual != expected`.
pub fn not_equals<T>(expected: T, actual: T, context: &str) -> Result<(), AssertionFailure>
where
    T: PartialEq + Debug,
{
    check(
        actual != expected,
        || format!("Assert not same: `{expected:?}`"),
        || {
            AssertionFailure::new(
                FailureKind::Comparison,
                format!("Failed asserting that `{actual:?}` is not identical to `{expected:?}`"),
                context,
            )
        },
        context,
    )
}

pub fn is_true(condition: bool, context: &str) -> Result<(), AssertionFailure> {
    check(
        condition,
        || "Assert true".to_string(),
        || {
            AssertionFailure::new(
                FailureKind::Comparison,
                "Failed asserting that value `false` is `true`",
                context,
            )
        },
        context,
    )
}

pub fn is_false(condition: bool, context: &str) -> Result<(), AssertionFailure> {
    check(
        !condition,
        || "Assert false".to_string(),
        || {
            AssertionFailure::new(
                FailureKind::Comparison,
                "Failed asserting that value `true` is `false`",
                context,
            )
        },
        context,
    )
}

/// Asserts that `haystack` holds an element equal to `needle`.
pub fn contains<T>(needle: &T, haystack: &[T], context: &str) -> Result<(), AssertionFailure>
where
    T: PartialEq + Debug,
{
    check(
        haystack.contains(needle),
        || "Assert contains".to_string(),
        || {
            AssertionFailure::new(
                FailureKind::Comparison,
                format!("Failed asserting that `{haystack:?}` contains `{needle:?}`"),
                context,
            )
        },
        context,
    )
}

pub fn is_none<T: Debug>(value: &Option<T>, context: &str) -> Result<(), AssertionFailure> {
    check(
        value.is_none(),
        || "Assert `None`".to_string(),
        || AssertionFailure::comparison(None::<()>, value, context),
        context,
    )
}

pub fn is_some<T: Debug>(value: &Option<T>, context: &str) -> Result<(), AssertionFailure> {
    check(
        value.is_some(),
        || "Assert `Some`".to_string(),
        || {
            AssertionFailure::new(
                FailureKind::Comparison,
                "Expected `Some(..)`, got `None`.",
                context,
            )
        },
        context,
    )
}

/// Fails the test explicitly.
///
/// The returned failure is meant to be returned from the body. If the body
/// swallows it and completes anyway, the test is marked risky.
pub fn fail(message: impl Into<String>) -> Failure {
    let assertion = AssertionFailure::new(FailureKind::Fail, message, "");
    let failure = Failure::new(assertion.clone());
    if let Some(active) = current() {
        active.record(Record::Failure(assertion));
        active.register_fail(failure.clone());
    }
    failure
}

/// Declares that the test must end with an error of type `E`.
pub fn expect_exception<E>()
where
    E: StdError + 'static,
{
    if let Some(active) = current() {
        active.expect(Expectation::Exception(ExpectedException::of::<E>()));
    }
}

/// Declares that the test must end with exactly this captured error.
pub fn expect_exception_instance(failure: &Failure) {
    if let Some(active) = current() {
        active.expect(Expectation::Exception(ExpectedException::instance(
            failure.clone(),
        )));
    }
}

/// Declares that the test must fail, optionally with the given assertion message.
pub fn expect_failure(message: Option<&str>) {
    if let Some(active) = current() {
        active.expect(Expectation::Failure(ExpectedFailure::new(
            message.map(str::to_string),
        )));
    }
}

/// Registers `object` for leak detection.
///
/// Once the test body has finished, every registered object must have been
/// dropped; one still alive fails the test.
pub fn not_leaks<T>(object: &Arc<T>, label: &str)
where
    T: Send + Sync + 'static,
{
    if let Some(active) = current() {
        let weak = Arc::downgrade(object);
        active.track(Tracked {
            label: if label.is_empty() {
                std::any::type_name::<T>().to_string()
            } else {
                label.to_string()
            },
            alive: Box::new(move || weak.strong_count() > 0),
        });
    }
}
