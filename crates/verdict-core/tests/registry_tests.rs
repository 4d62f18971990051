use std::sync::Arc;

use async_trait::async_trait;
use verdict_core::builtin::{ExpectException, ExpectFailure, Retry, Skip};
use verdict_core::failure::Fault;
use verdict_core::pipeline::{Intercept, Next, Placement};
use verdict_core::{
    Directive, Interceptor, InterceptorRegistry, RegistryError, RunTest, RunTestCase, RunTestSuite,
    TestInfo, TestResult,
};

/// Base directive with a declared default interceptor.
#[derive(Debug)]
struct Timeout {
    seconds: u64,
}

impl Directive for Timeout {
    fn fallback(&self) -> Option<Arc<dyn Interceptor>> {
        Some(Arc::new(Marker("fallback")))
    }
}

/// Specialised directive, declared as a `Timeout`.
#[derive(Debug)]
struct SlowTimeout;

impl Directive for SlowTimeout {}

#[derive(Debug)]
struct Undeclared;

impl Directive for Undeclared {}

struct Marker(&'static str);

impl Interceptor for Marker {
    fn as_test(self: Arc<Self>) -> Option<Arc<dyn Intercept<TestInfo, TestResult>>> {
        Some(self)
    }

    fn name(&self) -> &'static str {
        self.0
    }
}

#[async_trait]
impl Intercept<TestInfo, TestResult> for Marker {
    async fn intercept(&self, info: TestInfo, next: Next<'_, TestInfo, TestResult>) -> TestResult {
        next.run(info).await
    }
}

#[test]
fn test_fallback_is_used_without_mapping() {
    let registry = InterceptorRegistry::empty();
    let interceptor = registry.resolve(&Timeout { seconds: 1 }).unwrap();
    assert_eq!(interceptor.name(), "fallback");
}

#[test]
fn test_mapping_wins_over_fallback_and_receives_options() {
    let mut registry = InterceptorRegistry::empty();
    registry.map::<Timeout, _>(|t| {
        Arc::new(Marker(if t.seconds > 10 { "long" } else { "short" })) as Arc<dyn Interceptor>
    });

    assert_eq!(registry.resolve(&Timeout { seconds: 1 }).unwrap().name(), "short");
    assert_eq!(registry.resolve(&Timeout { seconds: 60 }).unwrap().name(), "long");
}

#[test]
fn test_supertype_chain_is_walked() {
    let mut registry = InterceptorRegistry::empty();
    registry.map::<Timeout, _>(|t| {
        Arc::new(Marker(if t.seconds > 10 { "long" } else { "short" })) as Arc<dyn Interceptor>
    });
    registry.subtype::<SlowTimeout, Timeout, _>(|_| Timeout { seconds: 120 });

    assert_eq!(registry.resolve(&SlowTimeout).unwrap().name(), "long");
}

#[test]
fn test_unresolvable_directive_fails_loudly() {
    let registry = InterceptorRegistry::new();
    let directives: Vec<Arc<dyn Directive>> = vec![Arc::new(Retry::default()), Arc::new(Undeclared)];

    let err = registry.from_directives::<RunTest>(&directives).err();
    match err {
        Some(RegistryError::Unresolved { directive }) => assert!(directive.ends_with("Undeclared")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_directives_are_filtered_by_contract() {
    let registry = InterceptorRegistry::new();
    let directives: Vec<Arc<dyn Directive>> = vec![
        Arc::new(Retry::new(2)),
        Arc::new(Skip::new("later")),
        Arc::new(ExpectFailure::any()),
    ];

    assert_eq!(registry.from_directives::<RunTest>(&directives).unwrap().len(), 3);
    // Only Skip also applies to whole cases.
    assert_eq!(registry.from_directives::<RunTestCase>(&directives).unwrap().len(), 1);
    assert!(registry.from_directives::<RunTestSuite>(&directives).unwrap().is_empty());
}

#[test]
fn test_builtin_placements() {
    let registry = InterceptorRegistry::new();
    let directives: Vec<Arc<dyn Directive>> = vec![
        Arc::new(Retry::default()),
        Arc::new(ExpectException::of::<Fault>()),
    ];
    let placements: Vec<Placement> = registry
        .from_directives::<RunTest>(&directives)
        .unwrap()
        .iter()
        .map(|i| i.placement())
        .collect();
    assert_eq!(placements, vec![Placement::Outer, Placement::Inner]);

    let configured: Vec<Placement> = registry
        .from_config::<RunTest>()
        .iter()
        .map(|i| i.placement())
        .collect();
    assert_eq!(
        configured,
        vec![
            Placement::Outer,
            Placement::Boundary,
            Placement::Boundary,
            Placement::Boundary
        ]
    );
}

#[test]
fn test_renderer_is_replaced_not_added() {
    let mut registry = InterceptorRegistry::new();
    let before = registry.from_config::<RunTest>().len();

    registry.set_renderer(Arc::new(Marker("custom")));
    assert_eq!(registry.from_config::<RunTest>().len(), before);

    registry.clear_renderer();
    assert_eq!(registry.from_config::<RunTest>().len(), before - 1);
}
