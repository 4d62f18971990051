use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use verdict_core::pipeline::{Intercept, Next, Pipeline, Terminal};

type Log = Arc<Mutex<Vec<String>>>;

struct Recording {
    name: &'static str,
    log: Log,
}

#[async_trait]
impl Intercept<u32, u32> for Recording {
    async fn intercept(&self, input: u32, next: Next<'_, u32, u32>) -> u32 {
        self.log.lock().unwrap().push(format!("{}-before", self.name));
        let output = next.run(input).await;
        self.log.lock().unwrap().push(format!("{}-after", self.name));
        output
    }
}

/// Runs the rest of the chain twice, like a retry.
struct Rerun {
    name: &'static str,
    log: Log,
}

#[async_trait]
impl Intercept<u32, u32> for Rerun {
    async fn intercept(&self, input: u32, next: Next<'_, u32, u32>) -> u32 {
        self.log.lock().unwrap().push(format!("{}-before", self.name));
        let first = next.run(input).await;
        let second = next.run(first).await;
        self.log.lock().unwrap().push(format!("{}-after", self.name));
        second
    }
}

struct ShortCircuit;

#[async_trait]
impl Intercept<u32, u32> for ShortCircuit {
    async fn intercept(&self, _input: u32, _next: Next<'_, u32, u32>) -> u32 {
        0
    }
}

fn recording_terminal(log: &Log) -> Terminal<u32, u32> {
    let log = Arc::clone(log);
    Arc::new(move |input: u32| -> BoxFuture<'static, u32> {
        log.lock().unwrap().push("terminal".to_string());
        Box::pin(async move { input + 1 })
    })
}

#[tokio::test]
async fn test_onion_order() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::prepare(vec![
        Arc::new(Recording {
            name: "A",
            log: Arc::clone(&log),
        }) as Arc<dyn Intercept<u32, u32>>,
        Arc::new(Recording {
            name: "B",
            log: Arc::clone(&log),
        }),
    ]);

    let handler = pipeline.with(recording_terminal(&log), "run");
    assert_eq!(handler.method(), "run");
    assert_eq!(handler.call(1).await, 2);

    assert_eq!(
        *log.lock().unwrap(),
        vec!["A-before", "B-before", "terminal", "B-after", "A-after"]
    );
}

#[tokio::test]
async fn test_onion_order_holds_across_reruns() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::prepare(vec![
        Arc::new(Rerun {
            name: "A",
            log: Arc::clone(&log),
        }) as Arc<dyn Intercept<u32, u32>>,
        Arc::new(Recording {
            name: "B",
            log: Arc::clone(&log),
        }),
    ]);

    let handler = pipeline.with(recording_terminal(&log), "run");
    assert_eq!(handler.call(1).await, 3);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "A-before", "B-before", "terminal", "B-after", "B-before", "terminal", "B-after",
            "A-after"
        ]
    );
}

#[tokio::test]
async fn test_short_circuit_skips_rest_of_chain() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::prepare(vec![
        Arc::new(ShortCircuit) as Arc<dyn Intercept<u32, u32>>,
        Arc::new(Recording {
            name: "A",
            log: Arc::clone(&log),
        }),
    ]);

    let handler = pipeline.with(recording_terminal(&log), "run");
    assert_eq!(handler.call(5).await, 0);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_is_reusable_across_handlers() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::prepare(vec![Arc::new(Recording {
        name: "A",
        log: Arc::clone(&log),
    }) as Arc<dyn Intercept<u32, u32>>]);
    assert_eq!(pipeline.len(), 1);

    let first = pipeline.with(recording_terminal(&log), "first");
    let second = pipeline.with(recording_terminal(&log), "second");
    assert_eq!(first.call(1).await, 2);
    assert_eq!(second.call(10).await, 11);
    assert_eq!(log.lock().unwrap().len(), 6);
}
