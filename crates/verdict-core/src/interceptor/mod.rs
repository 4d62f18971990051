//! Interceptors, directives and the registry that connects them.
//!
//! A *directive* is declarative metadata attached to a test, case or suite
//! ("retry up to 3 times", "expect this error"). The [`InterceptorRegistry`]
//! turns each directive into an [`Interceptor`], and a [`Contract`] selects the
//! level-specific [`Intercept`] implementation a runner needs.

mod error;
mod registry;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub use error::RegistryError;
pub use registry::InterceptorRegistry;

use crate::model::{CaseInfo, CaseResult, SuiteInfo, SuiteResult, TestInfo, TestResult};
use crate::pipeline::Intercept;

/// A constructed interceptor.
///
/// An interceptor may implement any subset of the three level contracts; the
/// registry keeps it whole and each runner picks the part it runs.
pub trait Interceptor: Send + Sync + 'static {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        None
    }

    fn as_case(self: Arc<Self>) -> Option<Arc<dyn Intercept<CaseInfo, CaseResult>>> {
        None
    }

    fn as_suite(self: Arc<Self>) -> Option<Arc<dyn Intercept<SuiteInfo, SuiteResult>>> {
        None
    }

    /// Name used in logs.
    fn name(&self) -> &'static str {
        crate::failure::short_type_name(std::any::type_name::<Self>())
    }
}

/// One of the three runner-level contracts.
pub trait Contract: 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Contract label, used in tracing and abort messages.
    const METHOD: &'static str;

    /// Picks this contract's implementation out of an interceptor.
    fn select(interceptor: Arc<dyn Interceptor>)
        -> Option<Arc<dyn Intercept<Self::Input, Self::Output>>>;
}

/// Test-level contract.
#[derive(Debug)]
pub enum RunTest {}

/// Case-level contract.
#[derive(Debug)]
pub enum RunTestCase {}

/// Suite-level contract.
#[derive(Debug)]
pub enum RunTestSuite {}

impl Contract for RunTest {
    type Input = TestInfo;
    type Output = TestResult;
    const METHOD: &'static str = "run_test";

    fn select(interceptor: Arc<dyn Interceptor>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        interceptor.as_test()
    }
}

impl Contract for RunTestCase {
    type Input = CaseInfo;
    type Output = CaseResult;
    const METHOD: &'static str = "run_test_case";

    fn select(interceptor: Arc<dyn Interceptor>) -> Option<Arc<dyn Intercept<CaseInfo, CaseResult>>> {
        interceptor.as_case()
    }
}

impl Contract for RunTestSuite {
    type Input = SuiteInfo;
    type Output = SuiteResult;
    const METHOD: &'static str = "run_test_suite";

    fn select(
        interceptor: Arc<dyn Interceptor>,
    ) -> Option<Arc<dyn Intercept<SuiteInfo, SuiteResult>>> {
        interceptor.as_suite()
    }
}

/// Type-erased access to a directive's concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Declarative metadata that resolves to an interceptor.
///
/// Any `'static` type can be a directive. [`fallback`](Directive::fallback)
/// is the interceptor the directive declares for itself; it is used only when
/// the registry has no mapping for the directive or any of its supertypes,
/// and is built from the directive's own options.
pub trait Directive: AsAny + fmt::Debug + Send + Sync {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        None
    }
}

/// Key under which a directive's concrete type is registered.
pub(crate) fn type_key(directive: &dyn Directive) -> TypeId {
    Any::type_id(directive.as_any())
}
