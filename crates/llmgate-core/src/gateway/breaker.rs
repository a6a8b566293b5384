//! Per-route circuit breaker.
//!
//! Converts a sustained provider outage from a stream of slow timeouts
//! into immediate rejections. One [`CircuitBreaker`] exists per route,
//! created on first use and kept for the life of the [`BreakerRegistry`].
//!
//! All state transitions happen under the route's `DashMap` entry guard,
//! which is never held across an `.await`.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::time::Instant;

use llmgate_types::config::BreakerConfig;
use llmgate_types::error::{GatewayError, ProviderError};
use llmgate_types::llm::BreakerStatus;

/// Circuit breaker state for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Rejecting calls until `next_retry`.
    Open { next_retry: Instant },
    /// One probe call is in flight; everything else is rejected.
    HalfOpen { probe_started: Instant, probe: u64 },
}

/// How a call got past [`CircuitBreaker::try_acquire`].
///
/// Completions are reported back with their admission so that only the
/// current probe can move a half-open circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted by a closed circuit.
    Normal,
    /// Admitted as the half-open probe with this id.
    Probe(u64),
}

/// Circuit breaker for a single route.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    threshold: u32,
    cooldown: Duration,
    total_calls: u64,
    total_failures: u64,
    last_error: Option<String>,
    last_failure_at: Option<DateTime<Utc>>,
    probes_issued: u64,
}

impl CircuitBreaker {
    pub fn new(config: &BreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            threshold: config.threshold.max(1),
            cooldown: config.cooldown(),
            total_calls: 0,
            total_failures: 0,
            last_error: None,
            last_failure_at: None,
            probes_issued: 0,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Ask to make a call at `now`.
    ///
    /// Returns `Err(retry_in)` when the call must be rejected. An open
    /// circuit whose cooldown has elapsed moves to half-open and admits
    /// this call as the probe. A probe that never reports back (its caller
    /// was cancelled) is considered abandoned after one cooldown, and the
    /// next attempt becomes the new probe.
    pub fn try_acquire(&mut self, now: Instant) -> Result<Admission, Duration> {
        match self.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::Open { next_retry } => {
                if now >= next_retry {
                    Ok(self.start_probe(now))
                } else {
                    Err(next_retry - now)
                }
            }
            CircuitState::HalfOpen { probe_started, .. } => {
                if now >= probe_started + self.cooldown {
                    Ok(self.start_probe(now))
                } else {
                    Err(Duration::ZERO)
                }
            }
        }
    }

    fn start_probe(&mut self, now: Instant) -> Admission {
        self.probes_issued += 1;
        self.state = CircuitState::HalfOpen {
            probe_started: now,
            probe: self.probes_issued,
        };
        Admission::Probe(self.probes_issued)
    }

    fn is_current_probe(&self, admission: Admission) -> bool {
        matches!(
            (self.state, admission),
            (CircuitState::HalfOpen { probe, .. }, Admission::Probe(id)) if probe == id
        )
    }

    /// Record a successful call admitted as `admission`.
    ///
    /// Only a closed circuit or the current probe's success changes state.
    /// Calls admitted before the circuit opened (or superseded probes) that
    /// finish late are counted but cannot close it.
    pub fn record_success(&mut self, admission: Admission) {
        self.total_calls += 1;
        match self.state {
            CircuitState::Closed => self.consecutive_failures = 0,
            CircuitState::HalfOpen { .. } if self.is_current_probe(admission) => {
                tracing::info!("Circuit closed after successful probe");
                self.consecutive_failures = 0;
                self.state = CircuitState::Closed;
            }
            CircuitState::Open { .. } | CircuitState::HalfOpen { .. } => {}
        }
    }

    /// Record a failed call admitted as `admission` that finished at `now`.
    pub fn record_failure(&mut self, now: Instant, error: &ProviderError, admission: Admission) {
        self.total_calls += 1;
        self.total_failures += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.to_string());
        self.last_failure_at = Some(Utc::now());

        match self.state {
            CircuitState::Closed => {
                if self.consecutive_failures >= self.threshold {
                    self.open(now);
                }
            }
            CircuitState::HalfOpen { .. } if self.is_current_probe(admission) => {
                // Probe failed: start a fresh cooldown from this failure.
                self.open(now);
            }
            // Late completion; the running cooldown or probe stays as is.
            CircuitState::Open { .. } | CircuitState::HalfOpen { .. } => {}
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open {
            next_retry: now + self.cooldown,
        };
    }

    /// Snapshot for CLI display.
    pub fn to_status(&self, route: &str, now: Instant) -> BreakerStatus {
        let (state, retry_in_ms) = match self.state {
            CircuitState::Closed => ("closed", None),
            CircuitState::Open { next_retry } => (
                "open",
                Some(next_retry.saturating_duration_since(now).as_millis() as u64),
            ),
            CircuitState::HalfOpen { .. } => ("half_open", None),
        };

        BreakerStatus {
            route: route.to_string(),
            state: state.to_string(),
            consecutive_failures: self.consecutive_failures,
            total_calls: self.total_calls,
            total_failures: self.total_failures,
            last_error: self.last_error.clone(),
            retry_in_ms,
            last_failure_at: self.last_failure_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Lazily-populated map of route name to circuit breaker.
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, CircuitBreaker>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Run `call` through the breaker for `route`.
    ///
    /// When the circuit is open, `call` is never invoked and
    /// [`GatewayError::CircuitOpen`] is returned.
    pub async fn call<T, F, Fut>(&self, route: &str, call: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let admission = self.acquire(route)?;

        match call().await {
            Ok(value) => {
                self.record_success(route, admission);
                Ok(value)
            }
            Err(err) => {
                self.record_failure(route, &err, admission);
                Err(err.into())
            }
        }
    }

    fn acquire(&self, route: &str) -> Result<Admission, GatewayError> {
        let mut breaker = self
            .breakers
            .entry(route.to_string())
            .or_insert_with(|| CircuitBreaker::new(&self.config));

        breaker.try_acquire(Instant::now()).map_err(|retry_in| {
            tracing::debug!(route, retry_in_ms = retry_in.as_millis() as u64, "Circuit open, rejecting call");
            GatewayError::CircuitOpen {
                route: route.to_string(),
                retry_in_ms: retry_in.as_millis() as u64,
            }
        })
    }

    fn record_success(&self, route: &str, admission: Admission) {
        if let Some(mut breaker) = self.breakers.get_mut(route) {
            breaker.record_success(admission);
        }
    }

    fn record_failure(&self, route: &str, error: &ProviderError, admission: Admission) {
        if let Some(mut breaker) = self.breakers.get_mut(route) {
            let was_open = matches!(breaker.state(), CircuitState::Open { .. });
            breaker.record_failure(Instant::now(), error, admission);
            if !was_open && matches!(breaker.state(), CircuitState::Open { .. }) {
                tracing::warn!(
                    route,
                    failures = breaker.consecutive_failures(),
                    cooldown_ms = self.config.cooldown_ms,
                    "Circuit opened"
                );
            }
        }
    }

    /// Current state of `route`'s breaker, if it has been used.
    pub fn state(&self, route: &str) -> Option<CircuitState> {
        self.breakers.get(route).map(|b| b.state())
    }

    /// Status of every known route, sorted by route name.
    pub fn status(&self) -> Vec<BreakerStatus> {
        let now = Instant::now();
        let mut statuses: Vec<BreakerStatus> = self
            .breakers
            .iter()
            .map(|entry| entry.value().to_status(entry.key(), now))
            .collect();
        statuses.sort_by(|a, b| a.route.cmp(&b.route));
        statuses
    }
}
