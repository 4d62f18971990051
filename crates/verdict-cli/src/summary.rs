//! Human-readable and JSON reports of a finished run.

use serde::Serialize;
use verdict_core::{MultipleResult, Record, RunResult, Status, Summary, TestResult};

fn tag(status: Status) -> &'static str {
    match status {
        Status::Passed => "PASS",
        Status::Failed => "FAIL",
        Status::Skipped => "SKIP",
        Status::Error => "ERR ",
        Status::Risky => "RISK",
        Status::Flaky => "FLKY",
        Status::Cancelled => "CNCL",
        Status::Aborted => "ABRT",
    }
}

/// Prints the run to stdout, one line per test.
pub fn print(run: &RunResult) {
    for suite in &run.results {
        println!("{} [{}]", suite.name(), suite.status);
        if let Some(failure) = &suite.failure {
            println!("  ! {failure}");
        }
        for case in &suite.results {
            println!("  {}", case.info.name());
            if let Some(failure) = &case.failure {
                println!("    ! {failure}");
            }
            for test in &case.results {
                print_test(test, "    ");
            }
        }
    }

    let summary = run.summary();
    let duration = run.finished_at - run.started_at;
    println!();
    println!(
        "{} tests: {} passed, {} failed, {} errors, {} skipped, {} risky, {} flaky ({} ms)",
        summary.total,
        summary.passed,
        summary.failed,
        summary.error,
        summary.skipped,
        summary.risky,
        summary.flaky,
        duration.num_milliseconds()
    );
    if summary.aborted > 0 || summary.broken_cases > 0 {
        println!(
            "{} aborted tests, {} cases failed before running",
            summary.aborted, summary.broken_cases
        );
    }
    println!("Result: {}", run.status);
}

fn print_test(test: &TestResult, indent: &str) {
    println!("{indent}[{}] {}", tag(test.status), test.info.name);

    if let Some(sub) = test.attribute::<MultipleResult>() {
        for (label, result) in sub.iter() {
            println!("{indent}  [{}] #{label}", tag(result.status));
        }
    }
    if test.status.is_failure() || test.status == Status::Risky {
        if let Some(failure) = &test.failure {
            println!("{indent}  {failure}");
        }
        for record in test.history().iter().filter(|r| !r.is_success()) {
            println!("{indent}  - {record}");
        }
    }
}

/// Serializable form of a run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub id: String,
    pub status: Status,
    pub started_at: String,
    pub duration_ms: i64,
    pub summary: Summary,
    pub tests: Vec<TestReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub broken_cases: Vec<CaseFailure>,
}

#[derive(Debug, Serialize)]
pub struct TestReport {
    pub suite: String,
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub assertions: Vec<AssertionReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_sets: Vec<DataSetReport>,
}

#[derive(Debug, Serialize)]
pub struct AssertionReport {
    pub passed: bool,
    pub assertion: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct DataSetReport {
    pub label: String,
    pub status: Status,
}

#[derive(Debug, Serialize)]
pub struct CaseFailure {
    pub suite: String,
    pub case: String,
    pub failure: String,
}

impl From<&Record> for AssertionReport {
    fn from(record: &Record) -> Self {
        Self {
            passed: record.is_success(),
            assertion: record.assertion().to_string(),
            context: record.context().to_string(),
        }
    }
}

impl TestReport {
    fn new(suite: &str, test: &TestResult) -> Self {
        Self {
            suite: suite.to_string(),
            name: test.info.full_name(),
            status: test.status,
            failure: test.failure.as_ref().map(|f| f.to_string()),
            assertions: test.history().iter().map(AssertionReport::from).collect(),
            data_sets: test
                .attribute::<MultipleResult>()
                .map(|sub| {
                    sub.iter()
                        .map(|(label, result)| DataSetReport {
                            label: label.to_string(),
                            status: result.status,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl From<&RunResult> for Report {
    fn from(run: &RunResult) -> Self {
        let mut tests = Vec::new();
        let mut broken_cases = Vec::new();
        for suite in &run.results {
            for case in &suite.results {
                if let Some(failure) = &case.failure {
                    broken_cases.push(CaseFailure {
                        suite: suite.name().to_string(),
                        case: case.info.name().to_string(),
                        failure: failure.to_string(),
                    });
                }
                tests.extend(case.results.iter().map(|t| TestReport::new(suite.name(), t)));
            }
        }

        Self {
            id: run.id.clone(),
            status: run.status,
            started_at: run.started_at.to_rfc3339(),
            duration_ms: (run.finished_at - run.started_at).num_milliseconds(),
            summary: run.summary(),
            tests,
            broken_cases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{assert, CaseDefinition, Engine, Filter, SuiteInfo, TestDefinition};

    #[tokio::test]
    async fn test_report_lists_every_test() {
        let suite = SuiteInfo::new("unit").with_case(
            CaseDefinition::free("Math")
                .with_test(TestDefinition::sync("adds", |_| {
                    assert::equals(2, 1 + 1, "sum")?;
                    Ok(serde_json::Value::Null)
                }))
                .with_test(TestDefinition::sync("silent", |_| Ok(serde_json::Value::Null))),
        );
        let run = Engine::default().run(vec![suite], &Filter::all()).await;

        let report = Report::from(&run);
        assert_eq!(report.tests.len(), 2);
        assert_eq!(report.tests[0].name, "Math::adds");
        assert_eq!(report.tests[0].assertions[0].context, "sum");
        assert_eq!(report.tests[1].status, Status::Risky);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["risky"], 1);
        assert_eq!(json["tests"][1]["status"], "risky");
        assert!(json.get("broken_cases").is_none());
    }
}
