use std::sync::Arc;

use serde_json::{json, Value};
use verdict_core::builtin::{DataLabel, DataProvider, DataSet, MultipleResult};
use verdict_core::{
    assert, CaseDefinition, CaseInfo, Failure, InterceptorRegistry, Status, TestDefinition,
    TestInfo, TestRunner,
};

fn runner() -> TestRunner {
    TestRunner::new(Arc::new(InterceptorRegistry::new()))
}

fn info(test: TestDefinition) -> TestInfo {
    let case = CaseInfo::new(Arc::new(CaseDefinition::free("Data")));
    TestInfo::new(test.name().to_string(), case, test)
}

/// Passes when its first argument is non-negative.
fn non_negative() -> TestDefinition {
    TestDefinition::sync("non_negative", |call| {
        let value: i64 = call.arg(0)?;
        assert::is_true(value >= 0, "value is non-negative")?;
        Ok(json!(value))
    })
}

#[tokio::test]
async fn test_duplicate_keys_get_suffixes() {
    let provider = DataProvider::from_sets(vec![
        DataSet::new(0, vec![json!(1)]),
        DataSet::new(1, vec![json!(2)]),
        DataSet::new(1, vec![json!(3)]),
        DataSet::new(1, vec![json!(4)]),
    ]);

    let result = runner()
        .run_test(info(non_negative().with_directive(provider)))
        .await;

    assert_eq!(result.status, Status::Passed);
    let sub = result.attribute::<MultipleResult>().unwrap();
    assert_eq!(sub.labels().collect::<Vec<_>>(), vec!["0", "1", "1~1", "1~2"]);

    let third = sub.get("1~1").unwrap();
    assert_eq!(third.value, json!(3));
    assert_eq!(third.status, Status::Passed);
    assert_eq!(
        third.info.attributes.get::<DataLabel>(),
        Some(&DataLabel("1~1".to_string()))
    );
}

#[tokio::test]
async fn test_one_failing_set_fails_the_test() {
    let provider = DataProvider::from_rows(vec![vec![json!(1)], vec![json!(-1)], vec![json!(2)]]);

    let result = runner()
        .run_test(info(non_negative().with_directive(provider)))
        .await;

    assert_eq!(result.status, Status::Failed);
    let sub = result.attribute::<MultipleResult>().unwrap();
    assert_eq!(sub.len(), 3);
    assert_eq!(sub.get("1").unwrap().status, Status::Failed);
    // Sets after the failing one still run.
    assert_eq!(sub.get("2").unwrap().status, Status::Passed);
}

#[tokio::test]
async fn test_panicking_set_is_an_error_sub_result() {
    let test = TestDefinition::sync("strict", |call| {
        let value: i64 = call.arg(0)?;
        if value == 0 {
            panic!("zero is not allowed");
        }
        assert::not_equals(0, value, "")?;
        Ok(Value::Null)
    })
    .with_directive(DataProvider::from_rows(vec![vec![json!(0)], vec![json!(5)]]));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Failed);
    let sub = result.attribute::<MultipleResult>().unwrap();
    assert_eq!(sub.get("0").unwrap().status, Status::Error);
    assert_eq!(sub.get("1").unwrap().status, Status::Passed);
}

#[tokio::test]
async fn test_failing_provider_is_an_error() {
    let provider = DataProvider::new(|| Err(Failure::msg("cannot load fixtures")));

    let result = runner()
        .run_test(info(non_negative().with_directive(provider)))
        .await;

    assert_eq!(result.status, Status::Error);
    assert_eq!(
        result.failure.map(|f| f.to_string()),
        Some("cannot load fixtures".to_string())
    );
}

#[tokio::test]
async fn test_string_keys_label_as_is() {
    let provider = DataProvider::from_sets(vec![
        DataSet::new("small", vec![json!(1)]),
        DataSet::new("large", vec![json!(1000)]),
    ]);

    let result = runner()
        .run_test(info(non_negative().with_directive(provider)))
        .await;

    let sub = result.attribute::<MultipleResult>().unwrap();
    assert_eq!(sub.labels().collect::<Vec<_>>(), vec!["small", "large"]);
}
