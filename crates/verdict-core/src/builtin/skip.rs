use std::sync::Arc;

use async_trait::async_trait;

use crate::interceptor::{Directive, Interceptor};
use crate::model::{CaseInfo, CaseResult, TestInfo, TestResult};
use crate::pipeline::{Intercept, Next};
use crate::status::Status;

/// Do not run the test (or every test of the case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub reason: String,
}

impl Skip {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Directive for Skip {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        Some(Arc::new(SkipInterceptor {
            reason: self.reason.clone(),
        }))
    }
}

/// Why a result was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason(pub String);

/// Short-circuits with `Skipped` without calling the rest of the chain.
#[derive(Debug)]
pub struct SkipInterceptor {
    reason: String,
}

impl Interceptor for SkipInterceptor {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }

    fn as_case(self: Arc<Self>) -> Option<Arc<dyn Intercept<CaseInfo, CaseResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for SkipInterceptor {
    async fn intercept(&self, info: TestInfo, _next: Next<'_, TestInfo, TestResult>) -> TestResult {
        TestResult::new(info, Status::Skipped).with_attribute(SkipReason(self.reason.clone()))
    }
}

#[async_trait]
impl Intercept<CaseInfo, CaseResult> for SkipInterceptor {
    async fn intercept(&self, info: CaseInfo, _next: Next<'_, CaseInfo, CaseResult>) -> CaseResult {
        let results = info
            .definition
            .tests()
            .map(|(name, test)| {
                let test_info = TestInfo::new(name, info.clone(), test.clone());
                TestResult::new(test_info, Status::Skipped)
                    .with_attribute(SkipReason(self.reason.clone()))
            })
            .collect();

        let mut result = CaseResult::from_results(info, results)
            .with_attribute(SkipReason(self.reason.clone()));
        result.status = Status::Skipped;
        result
    }
}
