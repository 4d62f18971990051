//! Verdict Core - interceptor-driven test execution engine.
//!
//! Discovered tests are run through a chain of interceptors at three levels
//! (suite, case, test). Retries, data-driven fan-out, expected errors and
//! assertion bookkeeping are all interceptors resolved from declarative
//! directives; the runners themselves only invoke bodies and aggregate
//! statuses.
//!
//! ```ignore
//! let suite = SuiteInfo::new("unit").with_case(
//!     CaseDefinition::free("Math").with_test(
//!         TestDefinition::sync("adds", |_| {
//!             assert::equals(4, 2 + 2, "sum")?;
//!             Ok(Value::Null)
//!         })
//!         .with_directive(Retry::new(3)),
//!     ),
//! );
//! let result = Engine::default().run(vec![suite], &Filter::all()).await;
//! assert!(result.status.is_successful());
//! ```

pub mod assert;
pub mod builtin;
pub mod config;
pub mod failure;
pub mod interceptor;
pub mod model;
pub mod pipeline;
pub mod runner;
pub mod status;

pub use assert::{AssertionContext, AssertionFailure, AssertionHistory, Record};
pub use builtin::{
    DataProvider, DataSet, ExpectException, ExpectFailure, MultipleResult, Retry, Skip,
};
pub use config::{Config, ConfigError};
pub use failure::{Failure, InstantiationFailure, PipelineFailure};
pub use interceptor::{
    Contract, Directive, Interceptor, InterceptorRegistry, RegistryError, RunTest, RunTestCase,
    RunTestSuite,
};
pub use model::{
    CaseDefinition, CaseInfo, CaseResult, RunResult, SuiteInfo, SuiteResult, Summary, TestCall,
    TestDefinition, TestInfo, TestResult,
};
pub use pipeline::{Intercept, Next, Pipeline, Placement};
pub use runner::{CaseRunner, Engine, Filter, SuiteRunner, TestRunner};
pub use status::Status;
