use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::interceptor::Interceptor;
use crate::model::{CaseInfo, CaseResult, SuiteInfo, SuiteResult, TestInfo, TestResult};
use crate::pipeline::{Intercept, Next};

/// Default renderer: one structured `tracing` event per start and finish.
///
/// Events carry the name, the final status and the duration in milliseconds
/// and can be consumed by any subscriber.
#[derive(Debug, Default)]
pub struct LogRenderer;

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl Interceptor for LogRenderer {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }

    fn as_case(self: Arc<Self>) -> Option<Arc<dyn Intercept<CaseInfo, CaseResult>>> {
        Some(self)
    }

    fn as_suite(self: Arc<Self>) -> Option<Arc<dyn Intercept<SuiteInfo, SuiteResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for LogRenderer {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        let name = info.full_name();
        let start = Instant::now();
        tracing::debug!(test = %name, "Test started");

        let result = next.run(info).await;
        let duration_ms = elapsed_ms(start);

        match &result.failure {
            Some(failure) if !result.status.is_successful() => tracing::warn!(
                test = %name,
                status = %result.status,
                duration_ms,
                failure = %failure,
                "Test finished"
            ),
            _ => tracing::info!(test = %name, status = %result.status, duration_ms, "Test finished"),
        }
        result
    }
}

#[async_trait]
impl Intercept<CaseInfo, CaseResult> for LogRenderer {
    async fn intercept(&self, info: CaseInfo, next: Next<'_, CaseInfo, CaseResult>) -> CaseResult {
        let name = info.name().to_string();
        let start = Instant::now();
        tracing::debug!(case = %name, tests = info.definition.len(), "Case started");

        let result = next.run(info).await;
        tracing::info!(
            case = %name,
            status = %result.status,
            failed = result.count_failed(),
            duration_ms = elapsed_ms(start),
            "Case finished"
        );
        result
    }
}

#[async_trait]
impl Intercept<SuiteInfo, SuiteResult> for LogRenderer {
    async fn intercept(&self, info: SuiteInfo, next: Next<'_, SuiteInfo, SuiteResult>) -> SuiteResult {
        let name = info.name.clone();
        let start = Instant::now();
        tracing::info!(suite = %name, cases = info.cases.len(), tests = info.test_count(), "Suite started");

        let result = next.run(info).await;
        tracing::info!(
            suite = %name,
            status = %result.status,
            failed = result.count_failed(),
            duration_ms = elapsed_ms(start),
            "Suite finished"
        );
        result
    }
}
