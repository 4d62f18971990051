//! Test, case and suite runners.
//!
//! Each level builds its own interceptor chain from the registry, wraps it
//! around a terminal step and turns every internal failure into a status. No
//! error or panic crosses a runner boundary.

mod case;
mod engine;
mod filter;
mod suite;

use std::sync::Arc;

pub use case::CaseRunner;
pub use engine::Engine;
pub use filter::Filter;
pub use suite::SuiteRunner;
pub use test::TestRunner;

use crate::interceptor::{Contract, Directive, InterceptorRegistry, RegistryError};
use crate::pipeline::{Intercept, Pipeline};

/// Builds the chain for contract `C`.
///
/// Configured interceptors come first, then the interceptors of each
/// directive set in order. The result is stable-sorted by placement.
fn build_pipeline<C: Contract>(
    registry: &InterceptorRegistry,
    directive_sets: &[&[Arc<dyn Directive>]],
) -> Result<Pipeline<C::Input, C::Output>, RegistryError> {
    let mut chain: Vec<Arc<dyn Intercept<C::Input, C::Output>>> = registry.from_config::<C>();
    for directives in directive_sets {
        chain.extend(registry.from_directives::<C>(directives)?);
    }
    chain.sort_by_key(|interceptor| interceptor.placement());
    Ok(Pipeline::prepare(chain))
}
