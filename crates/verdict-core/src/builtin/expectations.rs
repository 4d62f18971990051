//! Expected-exception and expected-failure handling.
//!
//! Directives only declare an [`Expectation`] into the running attempt's
//! context; [`ExpectationsInterceptor`] evaluates everything declared, by
//! directives or from inside the body, once the attempt has finished.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;

use crate::assert::{self, AssertionFailure, Expectation, ExpectedException, ExpectedFailure};
use crate::failure::Failure;
use crate::interceptor::{Directive, Interceptor};
use crate::model::{TestInfo, TestResult};
use crate::pipeline::{Intercept, Next, Placement};
use crate::status::Status;

/// The test must end with a given error.
#[derive(Debug, Clone)]
pub struct ExpectException(pub ExpectedException);

impl ExpectException {
    /// Any error of type `E`.
    pub fn of<E>() -> Self
    where
        E: StdError + 'static,
    {
        Self(ExpectedException::of::<E>())
    }

    /// Exactly this error instance.
    pub fn instance(failure: Failure) -> Self {
        Self(ExpectedException::instance(failure))
    }
}

impl Directive for ExpectException {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        Some(Arc::new(ExpectationConfigurator(Expectation::Exception(
            self.0.clone(),
        ))))
    }
}

/// The test must fail, optionally with a given assertion message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectFailure {
    pub message: Option<String>,
}

impl ExpectFailure {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl Directive for ExpectFailure {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        Some(Arc::new(ExpectationConfigurator(Expectation::Failure(
            ExpectedFailure::new(self.message.clone()),
        ))))
    }
}

/// Declares an expectation into the attempt's context before the body runs.
#[derive(Debug)]
pub struct ExpectationConfigurator(pub Expectation);

impl Interceptor for ExpectationConfigurator {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for ExpectationConfigurator {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        match assert::current() {
            Some(context) => context.expect(self.0.clone()),
            None => tracing::warn!(
                test = %info.full_name(),
                "No assertion context, expectation ignored"
            ),
        }
        next.run(info).await
    }

    fn placement(&self) -> Placement {
        Placement::Inner
    }
}

/// Evaluates the expectations of one attempt.
///
/// 1. An `Error` caused by an assertion failure becomes `Failed`.
/// 2. Declared expectations are evaluated last-declared first, each one
///    rewriting the result and appending one record.
/// 3. A failure raised through `fail` that the body swallowed marks a
///    completed test `Risky`, whatever the expectations concluded.
#[derive(Debug, Default)]
pub struct ExpectationsInterceptor;

impl Interceptor for ExpectationsInterceptor {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for ExpectationsInterceptor {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        let raw = next.run(info).await;

        let Some(context) = assert::current() else {
            return raw;
        };

        let mut result = raw.clone();
        if result.status == Status::Error
            && result
                .failure
                .as_ref()
                .is_some_and(|f| f.is::<AssertionFailure>())
        {
            result = result.with_status(Status::Failed);
        }

        for expectation in context.take_expectations().into_iter().rev() {
            let (rewritten, record) = expectation.evaluate(result);
            context.record(record);
            result = rewritten;
        }

        if raw.status.is_completed() {
            let swallowed = context.take_fails().into_iter().rev().find(|fail| {
                !raw.failure.as_ref().is_some_and(|actual| actual.same(fail))
            });
            if let Some(fail) = swallowed {
                tracing::debug!(test = %raw.info.full_name(), "Swallowed fail(), marking risky");
                result = result.with_status(Status::Risky).with_failure(fail);
            }
        }

        result
    }

    fn placement(&self) -> Placement {
        Placement::Boundary
    }
}
