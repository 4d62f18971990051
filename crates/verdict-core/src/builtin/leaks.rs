use std::sync::Arc;

use async_trait::async_trait;

use crate::assert::{self, AssertionFailure, FailureKind, Record, Success};
use crate::failure::Failure;
use crate::interceptor::Interceptor;
use crate::model::{TestInfo, TestResult};
use crate::pipeline::{Intercept, Next, Placement};
use crate::status::Status;

/// Fails an attempt when an object registered through
/// [`assert::not_leaks`] is still alive after the body finished.
#[derive(Debug, Default)]
pub struct LeakCheckInterceptor;

impl Interceptor for LeakCheckInterceptor {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for LeakCheckInterceptor {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        let result = next.run(info).await;

        let Some(context) = assert::current() else {
            return result;
        };
        let tracked = context.take_tracked();
        if tracked.is_empty() {
            return result;
        }

        let leaked: Vec<String> = tracked
            .into_iter()
            .filter(|t| (t.alive)())
            .map(|t| t.label)
            .collect();

        if leaked.is_empty() {
            context.record(Record::Success(Success::new("No objects leaked", "")));
            return result;
        }

        tracing::debug!(test = %result.info.full_name(), leaked = ?leaked, "Objects leaked");
        let failure = AssertionFailure::new(
            FailureKind::Leak,
            format!("Objects leaked: `{}`", leaked.join("`, `")),
            "",
        );
        context.record(Record::Failure(failure.clone()));

        // An earlier failure stays the primary cause.
        if result.status.is_failure() {
            result
        } else {
            result
                .with_status(Status::Failed)
                .with_failure(Failure::new(failure))
        }
    }

    fn placement(&self) -> Placement {
        Placement::Boundary
    }
}
