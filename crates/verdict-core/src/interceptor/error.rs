//! Interceptor resolution error types.

use thiserror::Error;

/// Errors raised while turning directives into interceptors.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No mapping, supertype mapping or fallback exists for a directive.
    #[error("No interceptor is registered for directive {directive}")]
    Unresolved { directive: &'static str },

    /// A directive's declared supertype chain loops back on itself.
    #[error("Supertype chain of directive {directive} is cyclic")]
    CyclicHierarchy { directive: &'static str },

    /// A registered factory or upcast received a directive of another type.
    #[error("Expected directive {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
