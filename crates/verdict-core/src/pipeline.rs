//! Chain-of-responsibility primitive shared by every runner level.
//!
//! A [`Pipeline`] is an immutable, ordered list of interceptors. Binding it to
//! a terminal step with [`Pipeline::with`] yields a [`Handler`]; calling the
//! handler dispatches to the first interceptor, which receives the input and a
//! [`Next`] continuation for the rest of the chain.
//!
//! ```text
//! handler.call(x)
//!   └─ A.intercept(x, next₁)
//!        └─ next₁.run(x) ─ B.intercept(x, next₂)
//!                              └─ next₂.run(x) ─ terminal(x)
//! ```
//!
//! `Next` is a cursor, not shared state: it can be run zero times
//! (short-circuit), once, or many times (retries) without interference.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::Instrument;

/// Where an interceptor sits in a test chain.
///
/// Runners stable-sort a chain by placement, so declaration order is kept
/// among interceptors with the same placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placement {
    /// Wraps whole runs of the rest of the chain (renderers, retries, fan-out).
    Outer,
    /// Wraps exactly one attempt and owns its state: the assertion context
    /// of a test, the instance of a case.
    Boundary,
    /// Runs inside the attempt's assertion context.
    Inner,
}

/// One step of an interceptor chain.
#[async_trait]
pub trait Intercept<I, O>: Send + Sync
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Handles `input`, calling `next` to continue down the chain.
    async fn intercept(&self, input: I, next: Next<'_, I, O>) -> O;

    fn placement(&self) -> Placement {
        Placement::Outer
    }
}

/// Final step of a chain.
pub type Terminal<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, O> + Send + Sync>;

type Chain<I, O> = Arc<[Arc<dyn Intercept<I, O>>]>;

/// An immutable, ordered list of interceptors.
pub struct Pipeline<I, O> {
    interceptors: Chain<I, O>,
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Freezes the interceptors in the given order.
    pub fn prepare(interceptors: impl IntoIterator<Item = Arc<dyn Intercept<I, O>>>) -> Self {
        Self {
            interceptors: interceptors.into_iter().collect(),
        }
    }

    /// Binds the chain to a terminal step.
    ///
    /// `method` names the contract being run and is only used for tracing.
    pub fn with(&self, terminal: Terminal<I, O>, method: &'static str) -> Handler<I, O> {
        Handler {
            interceptors: Arc::clone(&self.interceptors),
            terminal,
            method,
        }
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl<I, O> Clone for Pipeline<I, O> {
    fn clone(&self) -> Self {
        Self {
            interceptors: Arc::clone(&self.interceptors),
        }
    }
}

impl<I, O> fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

/// A pipeline bound to its terminal step.
pub struct Handler<I, O> {
    interceptors: Chain<I, O>,
    terminal: Terminal<I, O>,
    method: &'static str,
}

impl<I, O> Handler<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Runs the whole chain on `input`.
    pub async fn call(&self, input: I) -> O {
        let span = tracing::trace_span!("pipeline", method = self.method);
        self.start().run(input).instrument(span).await
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    fn start(&self) -> Next<'_, I, O> {
        Next {
            handler: self,
            cursor: 0,
        }
    }
}

/// Continuation to the rest of a chain.
pub struct Next<'a, I, O> {
    handler: &'a Handler<I, O>,
    cursor: usize,
}

impl<'a, I, O> Next<'a, I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Runs the remainder of the chain on `input`.
    pub fn run(self, input: I) -> BoxFuture<'a, O> {
        match self.handler.interceptors.get(self.cursor) {
            Some(interceptor) => {
                let next = Next {
                    handler: self.handler,
                    cursor: self.cursor + 1,
                };
                interceptor.intercept(input, next)
            }
            None => (self.handler.terminal)(input),
        }
    }

    /// Name of the contract this chain runs.
    pub fn method(&self) -> &'static str {
        self.handler.method
    }
}

impl<I, O> Clone for Next<'_, I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for Next<'_, I, O> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Double;

    #[async_trait]
    impl Intercept<u32, u32> for Double {
        async fn intercept(&self, input: u32, next: Next<'_, u32, u32>) -> u32 {
            next.run(input * 2).await
        }
    }

    struct Twice;

    #[async_trait]
    impl Intercept<u32, u32> for Twice {
        async fn intercept(&self, input: u32, next: Next<'_, u32, u32>) -> u32 {
            next.run(input).await + next.run(input).await
        }
    }

    fn identity() -> Terminal<u32, u32> {
        Arc::new(|x: u32| -> BoxFuture<'static, u32> { Box::pin(async move { x }) })
    }

    #[tokio::test]
    async fn test_empty_pipeline_calls_terminal() {
        let pipeline = Pipeline::<u32, u32>::prepare(Vec::new());
        assert!(pipeline.is_empty());
        let handler = pipeline.with(identity(), "run");
        assert_eq!(handler.call(7).await, 7);
    }

    #[tokio::test]
    async fn test_next_can_be_reused() {
        let counter = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&counter);
        let terminal: Terminal<u32, u32> = Arc::new(move |x: u32| -> BoxFuture<'static, u32> {
            *seen.lock().unwrap() += 1;
            Box::pin(async move { x })
        });

        let pipeline = Pipeline::prepare(vec![
            Arc::new(Twice) as Arc<dyn Intercept<u32, u32>>,
            Arc::new(Double),
        ]);
        let handler = pipeline.with(terminal, "run");

        assert_eq!(handler.call(3).await, 12);
        assert_eq!(*counter.lock().unwrap(), 2);
        // The handler is reusable after a full run.
        assert_eq!(handler.call(1).await, 4);
    }
}
