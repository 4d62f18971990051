use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::Value;
use verdict_core::builtin::RetryAttempt;
use verdict_core::{
    assert, CaseDefinition, CaseInfo, InterceptorRegistry, Retry, Status, TestDefinition,
    TestInfo, TestRunner,
};

fn runner() -> TestRunner {
    TestRunner::new(Arc::new(InterceptorRegistry::new()))
}

fn info(test: TestDefinition) -> TestInfo {
    let case = CaseInfo::new(Arc::new(CaseDefinition::free("Retries")));
    TestInfo::new(test.name().to_string(), case, test)
}

/// A test that fails until it has been called `passes_from` times.
fn eventually_passing(calls: &Arc<AtomicU32>, passes_from: u32) -> TestDefinition {
    let calls = Arc::clone(calls);
    TestDefinition::sync("eventually", move |_| {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        assert::is_true(call >= passes_from, "enough attempts")?;
        Ok(Value::Null)
    })
}

#[tokio::test]
async fn test_passing_after_failures_is_flaky() {
    let calls = Arc::new(AtomicU32::new(0));
    let test = eventually_passing(&calls, 3).with_directive(Retry::new(3));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Flaky);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        result.attribute::<RetryAttempt>(),
        Some(&RetryAttempt {
            attempt: 3,
            max_attempts: 3
        })
    );
}

#[tokio::test]
async fn test_exhausted_retries_keep_last_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let test = eventually_passing(&calls, u32::MAX).with_directive(Retry::new(2));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(result.failure.is_some());
    // Only the last attempt's history is attached.
    assert_eq!(result.history().len(), 1);
}

#[tokio::test]
async fn test_first_attempt_pass_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let test = eventually_passing(&calls, 1).with_directive(Retry::new(5));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Passed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_flaky_marking_can_be_disabled() {
    let calls = Arc::new(AtomicU32::new(0));
    let test = eventually_passing(&calls, 2).with_directive(Retry::new(3).mark_flaky(false));

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Passed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_errors_are_retried_too() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let test = TestDefinition::sync("panics_once", move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first call");
        }
        assert::is_true(true, "")?;
        Ok(Value::Null)
    })
    .with_directive(Retry::default());

    let result = runner().run_test(info(test)).await;

    assert_eq!(result.status, Status::Flaky);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
