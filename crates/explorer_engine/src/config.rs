use std::time::Duration;

use explorer_core::DEFAULT_FAILURE_PROBABILITY;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Delay between consecutive source start triggers; source k starts at k * interval.
    pub stagger_interval: Duration,
    pub tick_min: Duration,
    pub tick_max: Duration,
    /// Upper bound (exclusive) of a single progress increment, in percent.
    pub max_increment: f64,
    pub failure_probability: f64,
    /// Seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stagger_interval: Duration::from_millis(300),
            tick_min: Duration::from_millis(500),
            tick_max: Duration::from_millis(1500),
            max_increment: 20.0,
            failure_probability: DEFAULT_FAILURE_PROBABILITY,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tick interval minimum {min:?} exceeds maximum {max:?}")]
    InvertedTickRange { min: Duration, max: Duration },
    #[error("max increment must be a positive number, got {0}")]
    NonPositiveIncrement(f64),
    #[error("failure probability must be within [0, 1], got {0}")]
    FailureProbabilityOutOfRange(f64),
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_min > self.tick_max {
            return Err(ConfigError::InvertedTickRange {
                min: self.tick_min,
                max: self.tick_max,
            });
        }
        // Written negated so NaN is rejected too.
        if !(self.max_increment > 0.0 && self.max_increment.is_finite()) {
            return Err(ConfigError::NonPositiveIncrement(self.max_increment));
        }
        if !(0.0..=1.0).contains(&self.failure_probability) {
            return Err(ConfigError::FailureProbabilityOutOfRange(
                self.failure_probability,
            ));
        }
        Ok(())
    }

    pub(crate) fn cadence(&self) -> TickCadence {
        TickCadence {
            min: self.tick_min,
            max: self.tick_max,
            max_increment: self.max_increment,
        }
    }
}

/// Per-source tick timing and increment bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickCadence {
    pub min: Duration,
    pub max: Duration,
    pub max_increment: f64,
}
