use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;

use crate::failure::{Failure, InstantiationFailure};
use crate::interceptor::Interceptor;
use crate::model::{CaseInfo, CaseResult};
use crate::pipeline::{Intercept, Next, Placement};
use crate::status::Status;

/// Builds the shared case instance before any test of the case runs.
///
/// Cases of free functions and cases that already carry an instance pass
/// through untouched. A factory that fails or panics turns the whole case
/// into an `Error` result; none of its tests run. It sits at the case
/// boundary, so an outer `Skip` short-circuits before anything is built.
#[derive(Debug, Default)]
pub struct InstantiateCase;

impl Interceptor for InstantiateCase {
    fn as_case(self: Arc<Self>) -> Option<Arc<dyn Intercept<CaseInfo, CaseResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<CaseInfo, CaseResult> for InstantiateCase {
    async fn intercept(&self, info: CaseInfo, next: Next<'_, CaseInfo, CaseResult>) -> CaseResult {
        if info.instance.is_some() {
            return next.run(info).await;
        }

        let built = std::panic::catch_unwind(AssertUnwindSafe(|| info.definition.instantiate()))
            .unwrap_or_else(|payload| Some(Err(Failure::from_panic(payload))));

        match built {
            None => next.run(info).await,
            Some(Ok(instance)) => next.run(info.with_instance(instance)).await,
            Some(Err(cause)) => {
                tracing::warn!(case = info.name(), error = %cause, "Failed to instantiate test case");
                let failure = Failure::new(InstantiationFailure {
                    case: info.name().to_string(),
                    cause,
                });
                CaseResult::failed(info, Status::Error, failure)
            }
        }
    }

    fn placement(&self) -> Placement {
        Placement::Boundary
    }
}
