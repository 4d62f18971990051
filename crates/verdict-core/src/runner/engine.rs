use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{Filter, SuiteRunner};
use crate::config::{Config, RendererKind};
use crate::interceptor::InterceptorRegistry;
use crate::model::{RunResult, SuiteInfo};
use crate::status::Status;

/// Runs discovered suites end to end.
///
/// Owns the registry and the runner stack; one engine can serve many runs.
pub struct Engine {
    registry: Arc<InterceptorRegistry>,
    suites: SuiteRunner,
}

impl Engine {
    pub fn new(registry: InterceptorRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            suites: SuiteRunner::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// Engine with the built-in registry and the configured renderer.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = InterceptorRegistry::new();
        if config.render.renderer == RendererKind::None {
            registry.clear_renderer();
        }
        Self::new(registry)
    }

    pub fn registry(&self) -> &InterceptorRegistry {
        &self.registry
    }

    /// Runs the suites that `filter` accepts, in the given order.
    #[tracing::instrument(skip_all, fields(suites = suites.len()))]
    pub async fn run(&self, suites: Vec<SuiteInfo>, filter: &Filter) -> RunResult {
        let id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::info!(run = %id, "Run started");

        let mut results = Vec::with_capacity(suites.len());
        for suite in suites {
            if !filter.accepts_suite(&suite.name) {
                tracing::debug!(suite = %suite.name, "Suite filtered out");
                continue;
            }
            results.push(self.suites.run_suite(suite, filter).await);
        }

        let status = Status::aggregate(results.iter().map(|r| r.status));
        let finished_at = Utc::now();
        tracing::info!(
            run = %id,
            status = %status,
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Run finished"
        );

        RunResult {
            id,
            started_at,
            finished_at,
            results,
            status,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(InterceptorRegistry::new())
    }
}
