//! Registry resolving directives to interceptors.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use super::{type_key, Contract, Directive, Interceptor, RegistryError};
use crate::builtin::{
    AssertCollector, ExpectationsInterceptor, InstantiateCase, LeakCheckInterceptor, LogRenderer,
};
use crate::pipeline::Intercept;

type Factory = Arc<dyn Fn(&dyn Directive) -> Result<Arc<dyn Interceptor>, RegistryError> + Send + Sync>;
type Upcast = Arc<dyn Fn(&dyn Directive) -> Result<Arc<dyn Directive>, RegistryError> + Send + Sync>;

/// Declared supertype of a directive type.
struct Supertype {
    type_id: TypeId,
    upcast: Upcast,
}

/// Memoised outcome of walking a directive type's hierarchy.
#[derive(Clone)]
enum Resolution {
    /// A mapping was found, possibly after upcasting through supertypes.
    Mapped { upcasts: Vec<Upcast>, factory: Factory },
    /// Nothing is mapped; the directive's own fallback applies.
    Fallback,
}

/// Registry of interceptors.
///
/// Holds the statically configured interceptors (run for every test, case and
/// suite), the single active renderer, and the table mapping directive types
/// to interceptor constructors. Hierarchy walks are memoised per directive
/// type, misses included.
pub struct InterceptorRegistry {
    /// Interceptors run at every level, in order.
    configured: Vec<Arc<dyn Interceptor>>,

    /// The active renderer, always outermost.
    renderer: Option<Arc<dyn Interceptor>>,

    /// Directive type to interceptor constructor.
    factories: HashMap<TypeId, Factory>,

    /// Directive type to its declared supertype.
    supertypes: HashMap<TypeId, Supertype>,

    resolved: Mutex<HashMap<TypeId, Resolution>>,
}

impl InterceptorRegistry {
    /// Create a registry with the built-in configuration.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        // Register built-in interceptors
        registry.configure(Arc::new(InstantiateCase));
        registry.configure(Arc::new(AssertCollector));
        registry.configure(Arc::new(LeakCheckInterceptor));
        registry.configure(Arc::new(ExpectationsInterceptor));
        registry.set_renderer(Arc::new(LogRenderer));

        registry
    }

    /// Create a registry with nothing configured.
    pub fn empty() -> Self {
        Self {
            configured: Vec::new(),
            renderer: None,
            factories: HashMap::new(),
            supertypes: HashMap::new(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Add an interceptor that runs at every level it implements.
    pub fn configure(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.configured.push(interceptor);
    }

    /// Replace the active renderer.
    pub fn set_renderer(&mut self, renderer: Arc<dyn Interceptor>) {
        if let Some(previous) = self.renderer.replace(renderer) {
            tracing::debug!(previous = previous.name(), "Replacing renderer");
        }
    }

    /// Run without any renderer.
    pub fn clear_renderer(&mut self) {
        self.renderer = None;
    }

    /// Map directive type `D` to an interceptor constructor.
    ///
    /// The constructor receives the directive itself, so the interceptor is
    /// built from the directive's options.
    pub fn map<D, F>(&mut self, factory: F)
    where
        D: Directive + 'static,
        F: Fn(&D) -> Arc<dyn Interceptor> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |directive: &dyn Directive| {
            directive
                .as_any()
                .downcast_ref::<D>()
                .map(&factory)
                .ok_or(RegistryError::TypeMismatch {
                    expected: std::any::type_name::<D>(),
                    found: directive.type_name(),
                })
        });
        self.factories.insert(TypeId::of::<D>(), factory);
        self.invalidate();
    }

    /// Declare `P` as the supertype of directive type `C`.
    ///
    /// A `C` with no mapping of its own resolves as the `P` produced by
    /// `upcast`.
    pub fn subtype<C, P, F>(&mut self, upcast: F)
    where
        C: Directive + 'static,
        P: Directive + 'static,
        F: Fn(&C) -> P + Send + Sync + 'static,
    {
        let upcast: Upcast = Arc::new(move |directive: &dyn Directive| {
            directive
                .as_any()
                .downcast_ref::<C>()
                .map(|child| Arc::new(upcast(child)) as Arc<dyn Directive>)
                .ok_or(RegistryError::TypeMismatch {
                    expected: std::any::type_name::<C>(),
                    found: directive.type_name(),
                })
        });
        self.supertypes.insert(
            TypeId::of::<C>(),
            Supertype {
                type_id: TypeId::of::<P>(),
                upcast,
            },
        );
        self.invalidate();
    }

    /// Statically configured interceptors for contract `C`, renderer first.
    pub fn from_config<C: Contract>(&self) -> Vec<Arc<dyn Intercept<C::Input, C::Output>>> {
        self.renderer
            .iter()
            .chain(self.configured.iter())
            .filter_map(|interceptor| C::select(Arc::clone(interceptor)))
            .collect()
    }

    /// Resolve directives and keep the interceptors implementing contract `C`.
    ///
    /// Fails on the first directive that cannot be resolved; a declared
    /// directive is never dropped silently.
    pub fn from_directives<C: Contract>(
        &self,
        directives: &[Arc<dyn Directive>],
    ) -> Result<Vec<Arc<dyn Intercept<C::Input, C::Output>>>, RegistryError> {
        let mut interceptors = Vec::with_capacity(directives.len());
        for directive in directives {
            let interceptor = self.resolve(&**directive)?;
            if let Some(intercept) = C::select(interceptor) {
                interceptors.push(intercept);
            }
        }
        Ok(interceptors)
    }

    /// Resolve one directive to its interceptor.
    pub fn resolve(&self, directive: &dyn Directive) -> Result<Arc<dyn Interceptor>, RegistryError> {
        match self.resolution(directive)? {
            Resolution::Mapped { upcasts, factory } => {
                let mut current: Option<Arc<dyn Directive>> = None;
                for upcast in &upcasts {
                    let parent = upcast(current.as_deref().unwrap_or(directive))?;
                    current = Some(parent);
                }
                factory(current.as_deref().unwrap_or(directive))
            }
            Resolution::Fallback => directive.fallback().ok_or(RegistryError::Unresolved {
                directive: directive.type_name(),
            }),
        }
    }

    /// Number of statically configured interceptors, renderer included.
    pub fn configured_len(&self) -> usize {
        self.configured.len() + usize::from(self.renderer.is_some())
    }

    fn resolution(&self, directive: &dyn Directive) -> Result<Resolution, RegistryError> {
        let key = type_key(directive);
        if let Some(hit) = self.memo().get(&key) {
            return Ok(hit.clone());
        }

        // Walk the supertype chain until a mapping is found
        let mut upcasts = Vec::new();
        let mut seen = HashSet::new();
        let mut current = key;
        let resolution = loop {
            if !seen.insert(current) {
                return Err(RegistryError::CyclicHierarchy {
                    directive: directive.type_name(),
                });
            }
            if let Some(factory) = self.factories.get(&current) {
                break Resolution::Mapped {
                    upcasts,
                    factory: Arc::clone(factory),
                };
            }
            match self.supertypes.get(&current) {
                Some(parent) => {
                    upcasts.push(Arc::clone(&parent.upcast));
                    current = parent.type_id;
                }
                None => break Resolution::Fallback,
            }
        };

        tracing::trace!(
            directive = directive.type_name(),
            mapped = matches!(resolution, Resolution::Mapped { .. }),
            "Resolved directive"
        );
        self.memo().insert(key, resolution.clone());
        Ok(resolution)
    }

    fn memo(&self) -> std::sync::MutexGuard<'_, HashMap<TypeId, Resolution>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalidate(&mut self) {
        self.resolved
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    fn memoised(&self) -> usize {
        self.memo().len()
    }
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field(
                "configured",
                &self.configured.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .field("mapped", &self.factories.len())
            .finish()
    }
}
