//! Test definitions, per-run info objects and results.

mod attributes;
mod definition;
mod info;
mod result;

pub use attributes::Attributes;
pub use definition::{
    ArgumentError, CaseDefinition, CaseInstance, SuiteInfo, TestCall, TestDefinition,
};
pub use info::{CaseInfo, TestInfo};
pub use result::{CaseResult, RunResult, SuiteResult, Summary, TestResult};
