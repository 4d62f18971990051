use regex::Regex;

use crate::model::CaseDefinition;

/// Selects which suites and tests run.
///
/// An empty suite list accepts every suite. The test pattern is matched
/// against `<case>::<test>`.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    suites: Vec<String>,
    tests: Option<Regex>,
}

impl Filter {
    /// Accepts everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_suites<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suites.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.tests = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn accepts_suite(&self, name: &str) -> bool {
        self.suites.is_empty() || self.suites.iter().any(|s| s == name)
    }

    pub fn accepts_test(&self, case: &str, test: &str) -> bool {
        match &self.tests {
            Some(pattern) => pattern.is_match(&format!("{case}::{test}")),
            None => true,
        }
    }

    /// Returns true if at least one test of the case is accepted.
    pub fn accepts_case(&self, case: &CaseDefinition) -> bool {
        self.tests.is_none() || case.tests().any(|(name, _)| self.accepts_test(case.name(), name))
    }
}
