//! Built-in directives and interceptors.
//!
//! | Directive         | Interceptor                 | Placement |
//! |-------------------|-----------------------------|-----------|
//! | [`Retry`]         | [`RetryInterceptor`]        | Outer     |
//! | [`DataProvider`]  | [`DataProviderInterceptor`] | Outer     |
//! | [`Skip`]          | [`SkipInterceptor`]         | Outer     |
//! | [`ExpectException`], [`ExpectFailure`] | [`ExpectationConfigurator`] | Inner |
//!
//! The registry also configures these for every run:
//! [`LogRenderer`] (Outer), [`InstantiateCase`] (case level, Boundary),
//! [`AssertCollector`], [`LeakCheckInterceptor`] and
//! [`ExpectationsInterceptor`] (Boundary, in that order).

mod collector;
mod data_provider;
mod expectations;
mod instantiate;
mod leaks;
mod render;
mod retry;
mod skip;

pub use collector::AssertCollector;
pub use data_provider::{DataLabel, DataProvider, DataProviderInterceptor, DataSet, MultipleResult};
pub use expectations::{
    ExpectException, ExpectFailure, ExpectationConfigurator, ExpectationsInterceptor,
};
pub use instantiate::InstantiateCase;
pub use leaks::LeakCheckInterceptor;
pub use render::LogRenderer;
pub use retry::{Retry, RetryAttempt, RetryInterceptor};
pub use skip::{Skip, SkipInterceptor, SkipReason};
