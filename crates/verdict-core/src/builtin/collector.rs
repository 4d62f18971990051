use std::sync::Arc;

use async_trait::async_trait;

use crate::assert::{AssertionContext, AssertionHistory};
use crate::interceptor::Interceptor;
use crate::model::{TestInfo, TestResult};
use crate::pipeline::{Intercept, Next, Placement};
use crate::status::Status;

/// Owns the assertion context of each attempt.
///
/// A fresh [`AssertionContext`] is created per attempt and installed around
/// the rest of the chain, including across suspension points of the body. The
/// collected history is attached to the result as [`AssertionHistory`]; a
/// passed attempt without any record becomes `Risky`.
#[derive(Debug, Default)]
pub struct AssertCollector;

impl Interceptor for AssertCollector {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for AssertCollector {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        let context = AssertionContext::new();
        let result = context.scope(next.run(info)).await;

        let history = context.history();
        let result = if result.status == Status::Passed && history.is_empty() {
            result.with_status(Status::Risky)
        } else {
            result
        };
        result.with_attribute(AssertionHistory::new(history))
    }

    fn placement(&self) -> Placement {
        Placement::Boundary
    }
}
