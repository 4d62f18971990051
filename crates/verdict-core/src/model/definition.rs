//! Discovered, read-only test definitions.
//!
//! Discovery itself is not part of this crate: whoever finds the tests builds
//! these definitions once and hands them to the runners.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::failure::Failure;
use crate::interceptor::Directive;

/// Live grouping instance shared by all tests of one case run.
pub type CaseInstance = Arc<dyn Any + Send + Sync>;

type TestBody = Arc<dyn Fn(TestCall) -> BoxFuture<'static, Result<Value, Failure>> + Send + Sync>;
type InstanceFactory = Arc<dyn Fn() -> Result<CaseInstance, Failure> + Send + Sync>;

/// What a test body receives when it is invoked.
#[derive(Clone)]
pub struct TestCall {
    instance: Option<CaseInstance>,
    arguments: Arc<Vec<Value>>,
}

impl TestCall {
    pub(crate) fn new(instance: Option<CaseInstance>, arguments: Arc<Vec<Value>>) -> Self {
        Self {
            instance,
            arguments,
        }
    }

    /// The case instance, downcast to `T`.
    ///
    /// Returns `None` for free-function cases or when `T` is not the
    /// instance's type.
    pub fn instance<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.instance.as_deref().and_then(|i| i.downcast_ref::<T>())
    }

    /// Raw call arguments.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Deserializes the argument at `index`.
    pub fn arg<T>(&self, index: usize) -> Result<T, Failure>
    where
        T: DeserializeOwned,
    {
        let value = self
            .arguments
            .get(index)
            .ok_or(ArgumentError::Missing { index })?;
        serde_json::from_value(value.clone())
            .map_err(|source| Failure::new(ArgumentError::Invalid { index, source }))
    }
}

/// Errors raised while reading call arguments.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Missing argument at position {index}")]
    Missing { index: usize },

    #[error("Invalid argument at position {index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Handle to one invocable test.
#[derive(Clone)]
pub struct TestDefinition {
    name: String,
    body: TestBody,
    directives: Vec<Arc<dyn Directive>>,
}

impl TestDefinition {
    /// Creates a test with an async body.
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Failure>> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(move |call| -> BoxFuture<'static, Result<Value, Failure>> {
                Box::pin(body(call))
            }),
            directives: Vec::new(),
        }
    }

    /// Creates a test with a synchronous body.
    pub fn sync<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestCall) -> Result<Value, Failure> + Send + Sync + 'static,
    {
        Self::new(name, move |call| std::future::ready(body(call)))
    }

    /// Attaches a directive to this test.
    pub fn with_directive(mut self, directive: impl Directive + 'static) -> Self {
        self.directives.push(Arc::new(directive));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directives declared on this test, in declaration order.
    pub fn directives(&self) -> &[Arc<dyn Directive>] {
        &self.directives
    }

    pub(crate) fn invoke(&self, call: TestCall) -> BoxFuture<'static, Result<Value, Failure>> {
        (self.body)(call)
    }
}

impl fmt::Debug for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDefinition")
            .field("name", &self.name)
            .field("directives", &self.directives)
            .finish()
    }
}

/// A grouping of tests.
///
/// A case either has a concrete grouping type, built lazily through its
/// instance factory, or represents free functions without any instance.
#[derive(Clone)]
pub struct CaseDefinition {
    name: String,
    factory: Option<InstanceFactory>,
    tests: IndexMap<String, TestDefinition>,
    directives: Vec<Arc<dyn Directive>>,
}

impl CaseDefinition {
    /// Creates a case of free functions (no grouping instance).
    pub fn free(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            factory: None,
            tests: IndexMap::new(),
            directives: Vec::new(),
        }
    }

    /// Creates a case whose tests share an instance built by `factory`.
    pub fn grouped<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, Failure> + Send + Sync + 'static,
    {
        let mut case = Self::free(name);
        case.factory = Some(Arc::new(move || {
            factory().map(|instance| Arc::new(instance) as CaseInstance)
        }));
        case
    }

    /// Adds a test. A test with the same name replaces the earlier one but
    /// keeps its position.
    pub fn with_test(mut self, test: TestDefinition) -> Self {
        self.tests.insert(test.name.clone(), test);
        self
    }

    /// Attaches a directive that applies to every test of this case.
    pub fn with_directive(mut self, directive: impl Directive + 'static) -> Self {
        self.directives.push(Arc::new(directive));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the case has a concrete grouping type.
    pub fn is_grouped(&self) -> bool {
        self.factory.is_some()
    }

    /// Tests in discovery order.
    pub fn tests(&self) -> impl Iterator<Item = (&str, &TestDefinition)> {
        self.tests.iter().map(|(name, test)| (name.as_str(), test))
    }

    pub fn test(&self, name: &str) -> Option<&TestDefinition> {
        self.tests.get(name)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Directives declared on the case, in declaration order.
    pub fn directives(&self) -> &[Arc<dyn Directive>] {
        &self.directives
    }

    /// Builds the grouping instance, or `None` for free-function cases.
    pub(crate) fn instantiate(&self) -> Option<Result<CaseInstance, Failure>> {
        self.factory.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for CaseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseDefinition")
            .field("name", &self.name)
            .field("grouped", &self.is_grouped())
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .field("directives", &self.directives)
            .finish()
    }
}

/// A named suite and the cases discovered for it.
#[derive(Debug, Clone)]
pub struct SuiteInfo {
    pub name: String,
    pub cases: Vec<Arc<CaseDefinition>>,
    pub directives: Vec<Arc<dyn Directive>>,
}

impl SuiteInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Adds a case; cases run in the order they are added.
    pub fn with_case(mut self, case: CaseDefinition) -> Self {
        self.cases.push(Arc::new(case));
        self
    }

    /// Attaches a directive resolved against the suite-level contract.
    pub fn with_directive(mut self, directive: impl Directive + 'static) -> Self {
        self.directives.push(Arc::new(directive));
        self
    }

    /// Total number of tests across all cases.
    pub fn test_count(&self) -> usize {
        self.cases.iter().map(|c| c.len()).sum()
    }
}
