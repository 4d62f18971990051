//! Per-attempt assertion state and the current-context slot.
//!
//! The active [`AssertionContext`] lives in a thread-local slot. A test body
//! never sets it directly: [`ContextScope`] swaps the test's context in on
//! every poll of the body and swaps the previous one back before returning
//! control to the executor, so tests interleaved on the same thread always
//! record into their own context.
//!
//! ```text
//!           poll(A)              poll(B)             poll(A)
//! slot:  None → ctxA → None   None → ctxB → None   None → ctxA → None
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use super::expectation::Expectation;
use super::record::Record;
use crate::failure::Failure;

thread_local! {
    static CURRENT: RefCell<Option<AssertionContext>> = RefCell::new(None);
}

/// Returns the context of the test currently being polled on this thread.
pub fn current() -> Option<AssertionContext> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Installs `next` as the current context and returns the previous one.
pub fn swap(next: Option<AssertionContext>) -> Option<AssertionContext> {
    CURRENT.with(|slot| slot.replace(next))
}

/// An object registered for leak detection.
pub(crate) struct Tracked {
    pub(crate) label: String,
    pub(crate) alive: Box<dyn Fn() -> bool + Send>,
}

/// Mutable state of one test attempt.
#[derive(Default)]
pub(crate) struct TestState {
    history: Vec<Record>,
    expectations: Vec<Expectation>,
    fails: Vec<Failure>,
    tracked: Vec<Tracked>,
}

/// Shared handle to one attempt's assertion state.
#[derive(Clone, Default)]
pub struct AssertionContext {
    state: Arc<Mutex<TestState>>,
}

impl AssertionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `future` so it always runs with this context installed.
    pub fn scope<F>(&self, future: F) -> ContextScope<F>
    where
        F: Future,
    {
        ContextScope {
            context: self.clone(),
            inner: Box::pin(future),
        }
    }

    /// Appends a record to the history.
    pub fn record(&self, record: Record) {
        self.lock().history.push(record);
    }

    /// Snapshot of the history so far.
    pub fn history(&self) -> Vec<Record> {
        self.lock().history.clone()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Declares an expectation to evaluate once the attempt has finished.
    pub fn expect(&self, expectation: Expectation) {
        self.lock().expectations.push(expectation);
    }

    /// Returns true if both handles share the same state.
    pub fn same(&self, other: &AssertionContext) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Drains declared expectations in declaration order.
    pub(crate) fn take_expectations(&self) -> Vec<Expectation> {
        std::mem::take(&mut self.lock().expectations)
    }

    /// Remembers a failure raised through `fail` so a swallowed one can be
    /// detected.
    pub(crate) fn register_fail(&self, failure: Failure) {
        self.lock().fails.push(failure);
    }

    pub(crate) fn take_fails(&self) -> Vec<Failure> {
        std::mem::take(&mut self.lock().fails)
    }

    pub(crate) fn track(&self, tracked: Tracked) {
        self.lock().tracked.push(tracked);
    }

    pub(crate) fn take_tracked(&self) -> Vec<Tracked> {
        std::mem::take(&mut self.lock().tracked)
    }

    fn lock(&self) -> MutexGuard<'_, TestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AssertionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("AssertionContext")
            .field("history", &state.history.len())
            .field("expectations", &state.expectations.len())
            .field("tracked", &state.tracked.len())
            .finish()
    }
}

/// Future that runs its inner future with a context installed.
///
/// Created by [`AssertionContext::scope`].
pub struct ContextScope<F> {
    context: AssertionContext,
    inner: Pin<Box<F>>,
}

impl<F: Future> Future for ContextScope<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        // Restored on return and on unwind.
        let _restore = Restore(swap(Some(this.context.clone())));
        this.inner.as_mut().poll(cx)
    }
}

struct Restore(Option<AssertionContext>);

impl Drop for Restore {
    fn drop(&mut self) {
        swap(self.0.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::Success;

    #[test]
    fn test_swap_returns_previous() {
        let a = AssertionContext::new();
        assert!(swap(Some(a.clone())).is_none());
        let previous = swap(None);
        assert!(previous.is_some_and(|p| p.same(&a)));
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn test_scope_restores_outer_context() {
        let outer = AssertionContext::new();
        let inner = AssertionContext::new();

        let seen = outer
            .scope(async {
                let before = current();
                let nested = inner.scope(async { current() }).await;
                let after = current();
                (before, nested, after)
            })
            .await;

        assert!(seen.0.is_some_and(|c| c.same(&outer)));
        assert!(seen.1.is_some_and(|c| c.same(&inner)));
        assert!(seen.2.is_some_and(|c| c.same(&outer)));
        assert!(current().is_none());
    }

    #[test]
    fn test_record_appends_in_order() {
        let context = AssertionContext::new();
        context.record(Record::Success(Success::new("first", "")));
        context.record(Record::Success(Success::new("second", "")));

        let history = context.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].assertion(), "first");
    }
}
