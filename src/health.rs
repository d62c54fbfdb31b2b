//! Injectable dependency checks behind /health and /ready.
//!
//! The default database/cache checks are stubs that always report healthy.
//! A deployment can swap in a real probe behind the same trait without
//! touching the handlers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named dependency that can report whether it is usable.
pub trait DependencyProbe: Send + Sync {
    /// Name of the dependency, used as the key in check maps.
    fn name(&self) -> &str;

    /// Whether the dependency is currently healthy.
    fn check(&self) -> bool;
}

/// Probe that always reports healthy.
#[derive(Debug, Clone)]
pub struct AlwaysHealthy {
    name: String,
}

impl AlwaysHealthy {
    /// Create a probe for the given dependency name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DependencyProbe for AlwaysHealthy {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> bool {
        true
    }
}

/// Probe with a fixed outcome, for exercising the unhealthy paths.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    name: String,
    healthy: bool,
}

impl StaticProbe {
    /// Create a probe that always reports the given outcome.
    pub fn new(name: impl Into<String>, healthy: bool) -> Self {
        Self {
            name: name.into(),
            healthy,
        }
    }
}

impl DependencyProbe for StaticProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> bool {
        self.healthy
    }
}

/// Named set of dependency probes consulted by the health routes.
#[derive(Clone)]
pub struct HealthRegistry {
    probes: Vec<Arc<dyn DependencyProbe>>,
}

impl HealthRegistry {
    /// Create a registry from explicit probes.
    pub fn new(probes: Vec<Arc<dyn DependencyProbe>>) -> Self {
        Self { probes }
    }

    /// Default registry: database and cache, both permanent stubs.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Arc::new(AlwaysHealthy::new("database")),
            Arc::new(AlwaysHealthy::new("cache")),
        ])
    }

    /// Run every probe and collect the results keyed by name.
    pub fn results(&self) -> BTreeMap<String, bool> {
        self.probes
            .iter()
            .map(|probe| (probe.name().to_string(), probe.check()))
            .collect()
    }

    /// Whether every probe reports healthy.
    pub fn all_healthy(&self) -> bool {
        self.probes.iter().all(|probe| probe.check())
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("probes", &self.results())
            .finish()
    }
}
