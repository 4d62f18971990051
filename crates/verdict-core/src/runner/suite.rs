use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{build_pipeline, CaseRunner, Filter};
use crate::failure::{panic_message, Failure, PipelineFailure};
use crate::interceptor::{Contract, InterceptorRegistry, RunTestSuite};
use crate::model::{CaseInfo, SuiteInfo, SuiteResult};
use crate::pipeline::Terminal;
use crate::status::Status;

/// Runs every case of a suite, in discovery order.
pub struct SuiteRunner {
    registry: Arc<InterceptorRegistry>,
    cases: Arc<CaseRunner>,
}

impl SuiteRunner {
    pub fn new(registry: Arc<InterceptorRegistry>) -> Self {
        Self {
            cases: Arc::new(CaseRunner::new(Arc::clone(&registry))),
            registry,
        }
    }

    /// Runs the cases of one suite that `filter` accepts.
    #[tracing::instrument(skip_all, fields(suite = %info.name))]
    pub async fn run_suite(&self, info: SuiteInfo, filter: &Filter) -> SuiteResult {
        let pipeline = build_pipeline::<RunTestSuite>(&self.registry, &[info.directives.as_slice()]);
        let pipeline = match pipeline {
            Ok(pipeline) => pipeline,
            Err(source) => {
                tracing::warn!(error = %source, "Failed to build suite pipeline");
                return SuiteResult::failed(
                    info,
                    Status::Aborted,
                    Failure::new(PipelineFailure::Construction {
                        method: RunTestSuite::METHOD,
                        source,
                    }),
                );
            }
        };

        let handler = pipeline.with(self.terminal(filter), RunTestSuite::METHOD);
        match AssertUnwindSafe(handler.call(info.clone())).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(%message, "Suite interceptor panicked");
                SuiteResult::failed(
                    info,
                    Status::Aborted,
                    Failure::new(PipelineFailure::Panicked {
                        method: RunTestSuite::METHOD,
                        message,
                    }),
                )
            }
        }
    }

    fn terminal(&self, filter: &Filter) -> Terminal<SuiteInfo, SuiteResult> {
        let cases = Arc::clone(&self.cases);
        let filter = filter.clone();
        Arc::new(move |info: SuiteInfo| -> BoxFuture<'static, SuiteResult> {
            let cases = Arc::clone(&cases);
            let filter = filter.clone();
            Box::pin(async move {
                let mut results = Vec::with_capacity(info.cases.len());
                for definition in &info.cases {
                    if !filter.accepts_case(definition) {
                        continue;
                    }
                    let case = CaseInfo::new(Arc::clone(definition));
                    results.push(cases.run_case(case, &filter).await);
                }
                SuiteResult::from_results(info, results)
            })
        })
    }
}
