//! # Fault Harness
//!
//! Simulates a flaky backend: latency before each operation and a probability
//! of failing with `service_unavailable`. The API calls [`FaultInjector::before`]
//! once per operation, before any store access, so an injected failure never
//! leaves an operation half applied.
//!
//! The injector is a trait object on the API; swap it with
//! [`StashApi::with_faults`](crate::api::StashApi::with_faults).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::thread;
use std::time::Duration;

use crate::config::FaultConfig;
use crate::error::{Result, StashError};

pub trait FaultInjector {
    /// Called before operation `op` runs. An error aborts the operation.
    fn before(&self, op: &str) -> Result<()>;
}

/// Never delays, never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn before(&self, _op: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimulatedFaults {
    error_rate: f64,
    delay: (u64, u64),
    rng: RefCell<StdRng>,
}

impl SimulatedFaults {
    /// `error_rate` is clamped to `0.0..=1.0`; the delay bounds are swapped if
    /// given in the wrong order.
    pub fn new(error_rate: f64, delay_min_ms: u64, delay_max_ms: u64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            error_rate: error_rate.clamp(0.0, 1.0),
            delay: (delay_min_ms.min(delay_max_ms), delay_min_ms.max(delay_max_ms)),
            rng: RefCell::new(rng),
        }
    }

    pub fn from_config(config: &FaultConfig) -> Self {
        Self::new(
            config.error_rate,
            config.delay_min_ms,
            config.delay_max_ms,
            config.seed,
        )
    }

    /// Next delay to apply, in milliseconds.
    fn next_delay(&self) -> u64 {
        let (min, max) = self.delay;
        if min == max {
            min
        } else {
            self.rng.borrow_mut().gen_range(min..=max)
        }
    }
}

impl FaultInjector for SimulatedFaults {
    fn before(&self, op: &str) -> Result<()> {
        let delay = self.next_delay();
        if delay > 0 {
            tracing::trace!(op, delay_ms = delay, "simulated latency");
            thread::sleep(Duration::from_millis(delay));
        }

        if self.error_rate > 0.0 && self.rng.borrow_mut().gen_bool(self.error_rate) {
            tracing::warn!(op, "injected service_unavailable");
            return Err(StashError::ServiceUnavailable(format!(
                "simulated outage during {}",
                op
            )));
        }
        Ok(())
    }
}

/// Builds the injector described by `config`.
pub fn from_config(config: &FaultConfig) -> Box<dyn FaultInjector> {
    if config.enabled {
        Box::new(SimulatedFaults::from_config(config))
    } else {
        Box::new(NoFaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_faults_always_passes() {
        assert!(NoFaults.before("media.list").is_ok());
    }

    #[test]
    fn certain_failure_is_service_unavailable() {
        let faults = SimulatedFaults::new(1.0, 0, 0, Some(7));
        let err = faults.before("tags.create").unwrap_err();
        assert_eq!(err.status(), 503);
        assert!(err.to_string().contains("tags.create"));
    }

    #[test]
    fn zero_rate_never_fails() {
        let faults = SimulatedFaults::new(0.0, 0, 0, Some(7));
        for _ in 0..100 {
            assert!(faults.before("op").is_ok());
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let outcomes = |seed| {
            let faults = SimulatedFaults::new(0.5, 0, 0, Some(seed));
            (0..32).map(|_| faults.before("op").is_ok()).collect::<Vec<_>>()
        };
        assert_eq!(outcomes(42), outcomes(42));
        assert!(outcomes(42).iter().any(|ok| *ok));
        assert!(outcomes(42).iter().any(|ok| !*ok));
    }

    #[test]
    fn delay_stays_in_range() {
        let faults = SimulatedFaults::new(0.0, 5, 2, Some(1));
        for _ in 0..50 {
            let d = faults.next_delay();
            assert!((2..=5).contains(&d));
        }
    }

    #[test]
    fn rate_is_clamped() {
        let faults = SimulatedFaults::new(3.0, 0, 0, Some(1));
        assert!(faults.before("op").is_err());
    }

    #[test]
    fn disabled_config_builds_no_faults() {
        let config = FaultConfig {
            enabled: false,
            error_rate: 1.0,
            ..Default::default()
        };
        assert!(from_config(&config).before("op").is_ok());
    }
}
