use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use verdict_core::{
    assert, AssertionFailure, CaseDefinition, CaseInfo, ExpectException, ExpectFailure, Failure,
    InterceptorRegistry, Record, Status, TestDefinition, TestInfo, TestRunner,
};

#[derive(Debug, Error)]
#[error("runtime error: {0}")]
struct RuntimeError(String);

fn runner() -> TestRunner {
    TestRunner::new(Arc::new(InterceptorRegistry::new()))
}

fn info(test: TestDefinition) -> TestInfo {
    let case = CaseInfo::new(Arc::new(CaseDefinition::free("Expectations")));
    TestInfo::new(test.name().to_string(), case, test)
}

fn throws_runtime_error() -> TestDefinition {
    TestDefinition::sync("throws", |_| Err(RuntimeError("boom".into()).into()))
}

fn passes() -> TestDefinition {
    TestDefinition::sync("passes", |_| Ok(Value::Null))
}

fn assertions(result: &verdict_core::TestResult) -> Vec<(bool, String)> {
    result
        .history()
        .iter()
        .map(|r| (r.is_success(), r.assertion().to_string()))
        .collect()
}

#[tokio::test]
async fn test_expected_exception_thrown_passes() {
    let test = throws_runtime_error().with_directive(ExpectException::of::<RuntimeError>());

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Passed);
    assert_eq!(
        assertions(&result),
        vec![(true, "Throw exception: `RuntimeError`.".to_string())]
    );
}

#[tokio::test]
async fn test_expected_exception_not_thrown_fails() {
    let test = passes().with_directive(ExpectException::of::<RuntimeError>());

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Failed);
    assert_eq!(
        assertions(&result),
        vec![(
            false,
            "Expected exception of type `RuntimeError`, none thrown.".to_string()
        )]
    );
    assert!(result
        .failure
        .is_some_and(|f| f.is::<AssertionFailure>()));
}

#[tokio::test]
async fn test_wrong_exception_type_fails() {
    let test = TestDefinition::sync("faults", |_| Err(Failure::msg("unexpected")))
        .with_directive(ExpectException::of::<RuntimeError>());

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Failed);
    assert_eq!(
        result.history()[0].assertion(),
        "Expected exception of type `RuntimeError`, got `Fault`."
    );
}

#[tokio::test]
async fn test_expectation_declared_from_body() {
    let test = TestDefinition::sync("declares", |_| {
        assert::expect_exception::<RuntimeError>();
        Err(RuntimeError("late".into()).into())
    });

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Passed);
}

#[tokio::test]
async fn test_expected_instance_matches_identity_only() {
    let thrown = Failure::new(RuntimeError("shared".into()));
    let same = thrown.clone();
    let test = TestDefinition::sync("same_instance", move |_| Err(same.clone()))
        .with_directive(ExpectException::instance(thrown));
    assert_eq!(runner().run_test(info(test)).await.status, Status::Passed);

    let other = Failure::new(RuntimeError("shared".into()));
    let test = throws_runtime_error().with_directive(ExpectException::instance(other));
    assert_eq!(runner().run_test(info(test)).await.status, Status::Failed);
}

#[tokio::test]
async fn test_expectations_evaluate_last_declared_first() {
    let test = TestDefinition::sync("compares", |_| {
        assert::equals(1, 2, "numbers")?;
        Ok(Value::Null)
    })
    .with_directive(ExpectException::of::<RuntimeError>())
    .with_directive(ExpectException::of::<AssertionFailure>());

    let result = runner().run_test(info(test)).await;

    assert_eq!(
        assertions(&result),
        vec![
            (false, "Expected `1`, got `2`.".to_string()),
            (true, "Throw exception: `AssertionFailure`.".to_string()),
            (
                false,
                "Expected exception of type `RuntimeError`, got `AssertionFailure`.".to_string()
            ),
        ]
    );
    assert_eq!(result.status, Status::Failed);
}

#[tokio::test]
async fn test_expected_failure_with_message() {
    let test = TestDefinition::sync("compares", |_| {
        assert::equals("a", "b", "")?;
        Ok(Value::Null)
    })
    .with_directive(ExpectFailure::with_message("Expected `\"a\"`, got `\"b\"`."));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Passed);
    assert!(matches!(result.history().last(), Some(Record::Success(_))));
}

#[tokio::test]
async fn test_expected_failure_rejects_other_errors() {
    let test = throws_runtime_error().with_directive(ExpectFailure::any());

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Failed);
    assert_eq!(
        result.history()[0].assertion(),
        "Expected assertion failure, but got `RuntimeError`"
    );
}

#[tokio::test]
async fn test_propagated_fail_meets_expected_failure() {
    let test = TestDefinition::sync("fails", |_| Err(assert::fail("not ready")))
        .with_directive(ExpectFailure::with_message("not ready"));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Passed);
}

#[tokio::test]
async fn test_swallowed_fail_is_risky() {
    let test = TestDefinition::sync("swallows", |_| {
        let _ = assert::fail("ignored");
        assert::is_true(true, "")?;
        Ok(Value::Null)
    });

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Risky);
    assert_eq!(
        result.failure.map(|f| f.to_string()),
        Some("ignored".to_string())
    );
}

#[tokio::test]
async fn test_swallowed_fail_is_risky_even_when_failure_expected() {
    let test = TestDefinition::sync("swallows", |_| {
        let _ = assert::fail("ignored");
        Ok(Value::Null)
    })
    .with_directive(ExpectFailure::any());

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Risky);
}

#[derive(Default)]
struct Holder {
    kept: Mutex<Vec<Arc<String>>>,
}

fn grouped_info(test: TestDefinition) -> TestInfo {
    let case = CaseInfo::new(Arc::new(CaseDefinition::grouped("Holders", || {
        Ok(Holder::default())
    })))
    .with_instance(Arc::new(Holder::default()));
    TestInfo::new(test.name().to_string(), case, test)
}

#[tokio::test]
async fn test_leaked_object_fails_the_test() {
    let test = TestDefinition::sync("leaks", |call| {
        let resource = Arc::new("connection".to_string());
        assert::not_leaks(&resource, "connection");
        if let Some(holder) = call.instance::<Holder>() {
            holder.kept.lock().unwrap().push(resource);
        }
        Ok(Value::Null)
    });

    let result = runner().run_test(grouped_info(test)).await;

    assert_eq!(result.status, Status::Failed);
    assert_eq!(
        result.history().last().map(|r| r.assertion().to_string()),
        Some("Objects leaked: `connection`".to_string())
    );
}

#[tokio::test]
async fn test_released_object_passes() {
    let test = TestDefinition::sync("releases", |_| {
        let resource = Arc::new(42_u32);
        assert::not_leaks(&resource, "");
        drop(resource);
        Ok(Value::Null)
    });

    let result = runner().run_test(grouped_info(test)).await;

    assert_eq!(result.status, Status::Passed);
    assert_eq!(result.history()[0].assertion(), "No objects leaked");
}

#[tokio::test]
async fn test_leak_keeps_earlier_failure() {
    let test = TestDefinition::sync("leaks_and_fails", |call| {
        let resource = Arc::new("socket".to_string());
        assert::not_leaks(&resource, "socket");
        if let Some(holder) = call.instance::<Holder>() {
            holder.kept.lock().unwrap().push(resource);
        }
        assert::equals(1, 2, "")?;
        Ok(Value::Null)
    });

    let result = runner().run_test(grouped_info(test)).await;

    assert_eq!(result.status, Status::Failed);
    assert_eq!(
        result.failure.as_ref().map(|f| f.to_string()),
        Some("Expected `1`, got `2`.".to_string())
    );
    assert_eq!(result.history().len(), 2);
}
