//! Data-driven fan-out of a single test.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;

use crate::failure::Failure;
use crate::interceptor::{Directive, Interceptor};
use crate::model::{TestInfo, TestResult};
use crate::pipeline::{Intercept, Next};
use crate::status::Status;

type Provider = Arc<dyn Fn() -> Result<Vec<DataSet>, Failure> + Send + Sync>;

/// One argument set yielded by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Any value; its string form labels the sub-result.
    pub key: Value,
    pub arguments: Vec<Value>,
}

impl DataSet {
    pub fn new(key: impl Into<Value>, arguments: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            arguments,
        }
    }

    /// Label derived from the key: strings as-is, anything else in its JSON form.
    pub fn label(&self) -> String {
        match &self.key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Run a test once per data set.
#[derive(Clone)]
pub struct DataProvider {
    provider: Provider,
}

impl DataProvider {
    /// Uses a provider that is called once per run of the test.
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Result<Vec<DataSet>, Failure> + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Uses a fixed list of data sets.
    pub fn from_sets(sets: Vec<DataSet>) -> Self {
        Self::new(move || Ok(sets.clone()))
    }

    /// Uses argument lists keyed by their position.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let sets = rows
            .into_iter()
            .enumerate()
            .map(|(index, arguments)| DataSet::new(index, arguments))
            .collect();
        Self::from_sets(sets)
    }
}

impl fmt::Debug for DataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProvider").finish_non_exhaustive()
    }
}

impl Directive for DataProvider {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        Some(Arc::new(DataProviderInterceptor {
            provider: Arc::clone(&self.provider),
        }))
    }
}

/// Label of the data set a sub-run was called with, attached to its info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLabel(pub String);

/// Sub-results of a fanned-out test, keyed by unique label in yield order.
#[derive(Debug, Clone, Default)]
pub struct MultipleResult {
    results: IndexMap<String, TestResult>,
}

impl MultipleResult {
    pub fn get(&self, label: &str) -> Option<&TestResult> {
        self.results.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestResult)> {
        self.results.iter().map(|(label, result)| (label.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns `label`, or `label~1`, `label~2`, ... if it is already taken.
    fn unique_label(&self, label: String) -> String {
        if !self.results.contains_key(&label) {
            return label;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{label}~{n}");
            if !self.results.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Fans a test out over the sets yielded by its provider.
pub struct DataProviderInterceptor {
    provider: Provider,
}

impl DataProviderInterceptor {
    fn provide(&self) -> Result<Vec<DataSet>, Failure> {
        std::panic::catch_unwind(AssertUnwindSafe(|| (self.provider)()))
            .unwrap_or_else(|payload| Err(Failure::from_panic(payload)))
    }
}

impl Interceptor for DataProviderInterceptor {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for DataProviderInterceptor {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        let sets = match self.provide() {
            Ok(sets) => sets,
            Err(failure) => {
                tracing::warn!(test = %info.full_name(), error = %failure, "Data provider failed");
                return TestResult::new(info, Status::Error).with_failure(failure);
            }
        };

        let mut results = MultipleResult::default();
        for set in sets {
            let label = results.unique_label(set.label());
            let derived = info
                .with_arguments(set.arguments)
                .with_attribute(DataLabel(label.clone()));

            tracing::trace!(test = %info.full_name(), %label, "Running data set");
            let result = match AssertUnwindSafe(next.run(derived.clone()))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => {
                    TestResult::new(derived, Status::Error).with_failure(Failure::from_panic(payload))
                }
            };
            results.results.insert(label, result);
        }

        let status = if results.iter().any(|(_, r)| r.status.is_failure()) {
            Status::Failed
        } else {
            Status::Passed
        };
        TestResult::new(info, status).with_attribute(results)
    }
}
