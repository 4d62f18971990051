use std::sync::Arc;

use async_trait::async_trait;

use crate::interceptor::{Directive, Interceptor};
use crate::model::{TestInfo, TestResult};
use crate::pipeline::{Intercept, Next};
use crate::status::Status;

/// Default number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Re-run a failing test.
///
/// The test is attempted up to `max_attempts` times and stops at the first
/// attempt that is not a failure. A test that passes only after failing is
/// marked `Flaky` unless `mark_flaky` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub max_attempts: u32,
    pub mark_flaky: bool,
}

impl Retry {
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            mark_flaky: true,
        }
    }

    pub fn mark_flaky(mut self, mark_flaky: bool) -> Self {
        self.mark_flaky = mark_flaky;
        self
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl Directive for Retry {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        Some(Arc::new(RetryInterceptor::new(self.max_attempts, self.mark_flaky)))
    }
}

/// Attempt number, attached to the info of each attempt and to the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    pub attempt: u32,
    pub max_attempts: u32,
}

/// Outcome-based retry of the rest of the chain.
#[derive(Debug)]
pub struct RetryInterceptor {
    max_attempts: u32,
    mark_flaky: bool,
}

impl RetryInterceptor {
    pub fn new(max_attempts: u32, mark_flaky: bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            mark_flaky,
        }
    }
}

impl Interceptor for RetryInterceptor {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for RetryInterceptor {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        let mut failed_before = false;
        let mut attempt = 1;

        loop {
            let marker = RetryAttempt {
                attempt,
                max_attempts: self.max_attempts,
            };
            let result = next
                .run(info.with_attribute(marker))
                .await
                .with_attribute(marker);

            if !result.status.is_failure() {
                return if failed_before && self.mark_flaky && result.status.is_successful() {
                    tracing::debug!(test = %info.full_name(), attempt, "Passed after retry");
                    result.with_status(Status::Flaky)
                } else {
                    result
                };
            }

            if attempt >= self.max_attempts {
                tracing::debug!(
                    test = %info.full_name(),
                    attempts = attempt,
                    status = %result.status,
                    "Retries exhausted"
                );
                return result;
            }

            tracing::debug!(
                test = %info.full_name(),
                attempt,
                max_attempts = self.max_attempts,
                status = %result.status,
                "Attempt failed, retrying"
            );
            failed_before = true;
            attempt += 1;
        }
    }
}
