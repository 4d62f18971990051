//! Runtime failures captured while running tests.
//!
//! [`Failure`] plays the role of a thrown value: whatever escapes a test body,
//! an instance factory or an interceptor ends up wrapped in one and attached to
//! the result it produced. Nothing is ever propagated past a runner boundary.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::interceptor::RegistryError;

/// A shared, clonable handle to a captured error.
///
/// Two handles are [`same`](Failure::same) only if they point to the very
/// same captured error, which is how an expectation declared with an instance
/// is matched. [`is`](Failure::is) answers the "is-a" question by downcasting.
#[derive(Clone)]
pub struct Failure {
    error: Arc<dyn StdError + Send + Sync + 'static>,
    type_name: &'static str,
}

impl Failure {
    /// Wraps an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            error: Arc::new(error),
            type_name: std::any::type_name::<E>(),
        }
    }

    /// Creates a failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Fault(message.into()))
    }

    /// Creates a failure from a panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(Panic {
            message: panic_message(payload.as_ref()),
        })
    }

    /// Returns true if the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.error.is::<E>()
    }

    /// Returns the wrapped error as `E`, if it is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Returns true if both handles refer to the same captured error.
    pub fn same(&self, other: &Failure) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
    }

    /// Full type name of the wrapped error.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name of the wrapped error without its module path.
    pub fn short_type_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    /// The wrapped error.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.error.as_ref()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("type", &self.short_type_name())
            .field("message", &self.error.to_string())
            .finish()
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Failure::new(error)
    }
}

/// A failure carrying only a message.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Fault(pub String);

/// A panic captured from a test body or an instance factory.
#[derive(Debug, Error)]
#[error("panicked: {message}")]
pub struct Panic {
    pub message: String,
}

/// The execution harness failed while running a level.
#[derive(Debug, Error)]
pub enum PipelineFailure {
    #[error("Error during {method} pipeline construction: {source}")]
    Construction {
        method: &'static str,
        #[source]
        source: RegistryError,
    },

    #[error("Interceptor panicked during {method}: {message}")]
    Panicked { method: &'static str, message: String },
}

/// A case's grouping instance could not be constructed.
#[derive(Debug, Error)]
#[error("Failed to instantiate test case {case}: {cause}")]
pub struct InstantiationFailure {
    pub case: String,
    pub cause: Failure,
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    // Keep generic arguments intact, only strip the leading path.
    let head = name.split('<').next().unwrap_or(name);
    match head.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[derive(Debug, Error)]
    #[error("other")]
    struct Other;

    #[test]
    fn test_downcast_and_identity() {
        let failure = Failure::new(Boom);
        assert!(failure.is::<Boom>());
        assert!(!failure.is::<Other>());
        assert!(failure.downcast_ref::<Boom>().is_some());

        let copy = failure.clone();
        assert!(failure.same(&copy));
        assert!(!failure.same(&Failure::new(Boom)));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Boom"), "Boom");
        assert_eq!(short_type_name("Boom"), "Boom");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }

    #[test]
    fn test_panic_payloads() {
        let failure = Failure::from_panic(Box::new("static message"));
        assert_eq!(failure.to_string(), "panicked: static message");

        let failure = Failure::from_panic(Box::new(String::from("owned")));
        assert!(failure.is::<Panic>());
        assert_eq!(failure.to_string(), "panicked: owned");
    }
}
