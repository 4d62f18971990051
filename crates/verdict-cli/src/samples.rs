//! Suites bundled with the binary.
//!
//! They exercise every built-in directive, so `verdict run` doubles as a
//! smoke test of the engine.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use thiserror::Error;
use verdict_core::assert;
use verdict_core::{
    CaseDefinition, DataProvider, DataSet, ExpectException, ExpectFailure, Failure, Retry, Skip,
    SuiteInfo, TestDefinition,
};

#[derive(Debug, Error)]
#[error("division by zero")]
pub struct DivisionByZero;

fn divide(a: i64, b: i64) -> Result<i64, DivisionByZero> {
    if b == 0 {
        Err(DivisionByZero)
    } else {
        Ok(a / b)
    }
}

pub fn suites() -> Vec<SuiteInfo> {
    vec![unit(), integration()]
}

fn unit() -> SuiteInfo {
    SuiteInfo::new("unit")
        .with_case(math())
        .with_case(strings())
}

fn math() -> CaseDefinition {
    CaseDefinition::free("Math")
        .with_test(TestDefinition::sync("adds", |_| {
            assert::equals(4, 2 + 2, "sum")?;
            Ok(Value::Null)
        }))
        .with_test(
            TestDefinition::sync("divides_by_zero", |_| {
                let quotient = divide(1, 0)?;
                Ok(json!(quotient))
            })
            .with_directive(ExpectException::of::<DivisionByZero>()),
        )
        .with_test(
            TestDefinition::sync("halves", |call| {
                let (value, half): (i64, i64) = (call.arg(0)?, call.arg(1)?);
                assert::equals(half, divide(value, 2)?, "half")?;
                Ok(json!(half))
            })
            .with_directive(DataProvider::from_sets(vec![
                DataSet::new("even", vec![json!(10), json!(5)]),
                DataSet::new("odd", vec![json!(7), json!(3)]),
                DataSet::new("zero", vec![json!(0), json!(0)]),
            ])),
        )
        .with_test(
            TestDefinition::sync("rejects_negative_sqrt", |_| {
                assert::is_true((-1.0_f64).sqrt() >= 0.0, "sqrt(-1)")?;
                Ok(Value::Null)
            })
            .with_directive(ExpectFailure::any()),
        )
}

fn strings() -> CaseDefinition {
    let attempts = Arc::new(AtomicU32::new(0));

    CaseDefinition::free("Strings")
        .with_test(TestDefinition::sync("concat", |_| {
            let joined = ["ver", "dict"].concat();
            assert::equals("verdict", joined.as_str(), "concat")?;
            assert::contains(&'d', &joined.chars().collect::<Vec<_>>(), "")?;
            Ok(json!(joined))
        }))
        .with_test(
            TestDefinition::sync("eventually_uppercase", move |_| {
                // Fails on the first attempt only.
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                let word = if attempt == 0 { "verdict" } else { "VERDICT" };
                assert::equals("VERDICT", word, "uppercase")?;
                Ok(Value::Null)
            })
            .with_directive(Retry::new(3)),
        )
        .with_test(
            TestDefinition::sync("unicode_width", |_| Ok(Value::Null))
                .with_directive(Skip::new("needs a width table")),
        )
        .with_test(TestDefinition::sync("trims", |_| {
            // No assertion: reported as risky.
            let _ = "  padded ".trim();
            Ok(Value::Null)
        }))
}

/// Shared by the tests of the `Inventory` case.
#[derive(Default)]
struct Inventory {
    items: Mutex<Vec<String>>,
}

impl Inventory {
    fn add(&self, item: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.push(item.to_string());
        }
    }

    fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }
}

fn integration() -> SuiteInfo {
    let inventory = CaseDefinition::grouped("Inventory", || Ok(Inventory::default()))
        .with_test(TestDefinition::sync("stores", |call| {
            let inventory = call
                .instance::<Inventory>()
                .ok_or_else(|| Failure::msg("no inventory"))?;
            inventory.add("apple");
            assert::equals(1, inventory.len(), "after first add")?;
            Ok(Value::Null)
        }))
        .with_test(TestDefinition::sync("keeps_state", |call| {
            let inventory = call
                .instance::<Inventory>()
                .ok_or_else(|| Failure::msg("no inventory"))?;
            inventory.add("pear");
            assert::equals(2, inventory.len(), "shared instance")?;
            Ok(Value::Null)
        }))
        .with_test(TestDefinition::sync("releases_buffers", |_| {
            let buffer = Arc::new(vec![0_u8; 64]);
            assert::not_leaks(&buffer, "buffer");
            assert::equals(64, buffer.len(), "size")?;
            drop(buffer);
            Ok(Value::Null)
        }))
        .with_test(TestDefinition::new("waits", |_| async {
            tokio::task::yield_now().await;
            assert::is_some(&Some("ready"), "after yield")?;
            Ok::<Value, Failure>(Value::Null)
        }));

    SuiteInfo::new("integration").with_case(inventory)
}
