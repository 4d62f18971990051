use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use super::attributes::Attributes;
use super::definition::{CaseDefinition, CaseInstance, TestDefinition};

/// Information about a case being run.
///
/// The instance starts empty and is filled in once, before the first test
/// runs, if the case has a concrete grouping type.
#[derive(Debug, Clone)]
pub struct CaseInfo {
    pub definition: Arc<CaseDefinition>,
    pub instance: Option<CaseInstance>,
    pub attributes: Attributes,
}

impl CaseInfo {
    pub fn new(definition: Arc<CaseDefinition>) -> Self {
        Self {
            definition,
            instance: None,
            attributes: Attributes::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns a copy carrying the given instance.
    pub fn with_instance(&self, instance: CaseInstance) -> Self {
        Self {
            instance: Some(instance),
            ..self.clone()
        }
    }

    /// Returns a copy with an extra attribute.
    pub fn with_attribute<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            attributes: self.attributes.with(value),
            ..self.clone()
        }
    }
}

/// Information about one test attempt.
#[derive(Debug, Clone)]
pub struct TestInfo {
    pub name: String,
    pub case: CaseInfo,
    pub definition: TestDefinition,
    pub arguments: Arc<Vec<Value>>,
    pub attributes: Attributes,
}

impl TestInfo {
    pub fn new(name: impl Into<String>, case: CaseInfo, definition: TestDefinition) -> Self {
        Self {
            name: name.into(),
            case,
            definition,
            arguments: Arc::new(Vec::new()),
            attributes: Attributes::new(),
        }
    }

    /// `<case>::<test>`, the name used for filtering and reporting.
    pub fn full_name(&self) -> String {
        format!("{}::{}", self.case.name(), self.name)
    }

    /// Returns a copy that calls the test with another argument set.
    pub fn with_arguments(&self, arguments: Vec<Value>) -> Self {
        Self {
            arguments: Arc::new(arguments),
            ..self.clone()
        }
    }

    /// Returns a copy with an extra attribute.
    pub fn with_attribute<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            attributes: self.attributes.with(value),
            ..self.clone()
        }
    }
}
