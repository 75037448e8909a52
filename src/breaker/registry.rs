//! Name-keyed registry of circuit breakers.
//!
//! An explicit, injectable object rather than a hidden module global, so
//! tests and embedders isolate state by constructing their own registry.
//! Creation is atomic under the registry lock: two concurrent lookups for
//! the same name observe the same instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use super::{BreakerMetrics, CircuitBreaker, CircuitBreakerConfig};

/// Well-known breaker names used by the presets.
pub mod names {
    /// General breaker guarding the API call path.
    pub const API_GENERAL: &str = "api-general";
    /// Fast-trip breaker for internal client wiring failures.
    pub const CLIENT_BINDING: &str = "client-binding";
    /// Breaker for the cross-cutting catalog synchronization feature.
    pub const CATALOG_SYNC: &str = "catalog-sync";
    /// Breaker for the user data-preferences dependency.
    pub const USER_PREFERENCES: &str = "user-preferences";
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A breaker exists under this name with a different configuration.
    /// Configuration is honored only on first creation, and a silent
    /// mismatch is treated as a caller bug.
    #[error("breaker '{name}' already registered with a different config")]
    ConfigMismatch { name: String },
}

/// Process-scoped store of named breakers.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a breaker, creating it with `config` on first request.
    ///
    /// Re-requesting an existing name with the same config returns the
    /// existing instance; a differing config is an error.
    pub fn get_or_create(
        &self,
        name: &str,
        config: CircuitBreakerConfig,
    ) -> Result<Arc<CircuitBreaker>, RegistryError> {
        let mut breakers = self.breakers.lock().unwrap();
        if let Some(existing) = breakers.get(name) {
            if *existing.config() != config {
                return Err(RegistryError::ConfigMismatch {
                    name: name.to_string(),
                });
            }
            return Ok(existing.clone());
        }
        let breaker = Arc::new(CircuitBreaker::new(name, config));
        breakers.insert(name.to_string(), breaker.clone());
        tracing::debug!(breaker = name, "registered circuit breaker");
        Ok(breaker)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.lock().unwrap().get(name).cloned()
    }

    /// General breaker for the API call path: threshold 5, 30 s recovery.
    pub fn api_general(&self) -> Arc<CircuitBreaker> {
        self.preset(names::API_GENERAL, CircuitBreakerConfig::default())
    }

    /// Fast-trip, fast-recovery breaker for client integrity failures:
    /// threshold 1, 5 s recovery.
    pub fn client_binding(&self) -> Arc<CircuitBreaker> {
        self.preset(
            names::CLIENT_BINDING,
            CircuitBreakerConfig {
                failure_threshold: 1,
                recovery_timeout: Duration::from_secs(5),
                monitoring_period: Duration::from_secs(60),
                success_threshold: 1,
            },
        )
    }

    /// Moderate breaker for catalog synchronization: threshold 3, 60 s
    /// recovery.
    pub fn catalog_sync(&self) -> Arc<CircuitBreaker> {
        self.preset(
            names::CATALOG_SYNC,
            CircuitBreakerConfig {
                failure_threshold: 3,
                recovery_timeout: Duration::from_secs(60),
                monitoring_period: Duration::from_secs(120),
                success_threshold: 1,
            },
        )
    }

    /// Breaker for the user preferences dependency: threshold 3, 10 s
    /// recovery, two consecutive probe successes to fully close.
    pub fn user_preferences(&self) -> Arc<CircuitBreaker> {
        self.preset(
            names::USER_PREFERENCES,
            CircuitBreakerConfig {
                failure_threshold: 3,
                recovery_timeout: Duration::from_secs(10),
                monitoring_period: Duration::from_secs(60),
                success_threshold: 2,
            },
        )
    }

    /// Open every registered breaker.
    pub fn force_open_all(&self, recovery: Option<Duration>) {
        for breaker in self.snapshot() {
            breaker.force_open(recovery);
        }
    }

    /// Reset every registered breaker to the zero closed state.
    pub fn force_reset_all(&self) {
        for breaker in self.snapshot() {
            breaker.force_reset();
        }
    }

    pub fn all_metrics(&self) -> Vec<BreakerMetrics> {
        self.snapshot().iter().map(|b| b.metrics()).collect()
    }

    /// Drop every registered instance. Existing `Arc` handles keep working
    /// but are no longer shared through the registry.
    pub fn clear_all(&self) {
        self.breakers.lock().unwrap().clear();
    }

    /// Preset lookup: the well-known config wins on first creation; if the
    /// name was already taken the existing instance is returned as-is.
    fn preset(&self, name: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap();
        breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, config)))
            .clone()
    }

    fn snapshot(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers.lock().unwrap().values().cloned().collect()
    }
}
