use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{build_pipeline, Filter, TestRunner};
use crate::failure::{panic_message, Failure, PipelineFailure};
use crate::interceptor::{Contract, InterceptorRegistry, RunTestCase};
use crate::model::{CaseInfo, CaseResult, TestInfo};
use crate::pipeline::Terminal;
use crate::status::Status;

/// Runs every test of a case, in discovery order.
pub struct CaseRunner {
    registry: Arc<InterceptorRegistry>,
    tests: Arc<TestRunner>,
}

impl CaseRunner {
    pub fn new(registry: Arc<InterceptorRegistry>) -> Self {
        Self {
            tests: Arc::new(TestRunner::new(Arc::clone(&registry))),
            registry,
        }
    }

    /// Runs the tests of one case that `filter` accepts.
    ///
    /// The case status is `Failed` if any test is a failure, `Passed`
    /// otherwise.
    #[tracing::instrument(skip_all, fields(case = info.name()))]
    pub async fn run_case(&self, info: CaseInfo, filter: &Filter) -> CaseResult {
        let pipeline = build_pipeline::<RunTestCase>(&self.registry, &[info.definition.directives()]);
        let pipeline = match pipeline {
            Ok(pipeline) => pipeline,
            Err(source) => {
                tracing::warn!(error = %source, "Failed to build case pipeline");
                return CaseResult::failed(
                    info,
                    Status::Aborted,
                    Failure::new(PipelineFailure::Construction {
                        method: RunTestCase::METHOD,
                        source,
                    }),
                );
            }
        };

        let handler = pipeline.with(self.terminal(filter), RunTestCase::METHOD);
        match AssertUnwindSafe(handler.call(info.clone())).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(%message, "Case interceptor panicked");
                CaseResult::failed(
                    info,
                    Status::Aborted,
                    Failure::new(PipelineFailure::Panicked {
                        method: RunTestCase::METHOD,
                        message,
                    }),
                )
            }
        }
    }

    fn terminal(&self, filter: &Filter) -> Terminal<CaseInfo, CaseResult> {
        let tests = Arc::clone(&self.tests);
        let filter = filter.clone();
        Arc::new(move |info: CaseInfo| -> BoxFuture<'static, CaseResult> {
            let tests = Arc::clone(&tests);
            let filter = filter.clone();
            Box::pin(async move {
                let mut results = Vec::with_capacity(info.definition.len());
                for (name, definition) in info.definition.tests() {
                    if !filter.accepts_test(info.name(), name) {
                        continue;
                    }
                    let test = TestInfo::new(name, info.clone(), definition.clone());
                    results.push(tests.run_test(test).await);
                }
                CaseResult::from_results(info, results)
            })
        })
    }
}
