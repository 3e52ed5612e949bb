//! Guard against sudden unit-count drops.
//!
//! When a source's markup changes, discovery may silently find far fewer
//! units than before and every missing unit would be reported as deleted.
//! When enabled, the breaker aborts the run before anything is notified or
//! persisted if the hashed unit count drops more than `max_drop_percent`.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Circuit breaker configuration (`[guard]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Off unless explicitly enabled
    #[serde(default)]
    pub enabled: bool,
    /// Maximum allowed drop percentage (0-100). Default: 20%
    #[serde(default = "default_max_drop_percent")]
    pub max_drop_percent: u8,
    /// Previous snapshots smaller than this are not checked.
    #[serde(default = "default_min_baseline")]
    pub min_baseline: usize,
    /// Allow empty results when previous was also empty
    #[serde(default = "default_allow_cold_start")]
    pub allow_cold_start: bool,
}

fn default_max_drop_percent() -> u8 {
    20
}

fn default_min_baseline() -> usize {
    10
}

fn default_allow_cold_start() -> bool {
    true
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_drop_percent: default_max_drop_percent(),
            min_baseline: default_min_baseline(),
            allow_cold_start: default_allow_cold_start(),
        }
    }
}

/// Circuit breaker for preventing bad snapshot updates.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
}

/// Result of circuit breaker check.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitBreakerResult {
    /// Guard switched off
    Disabled,
    /// Safe to proceed
    Safe {
        current_count: usize,
        previous_count: usize,
    },
    /// First run or previous snapshot below baseline
    ColdStart { current_count: usize },
    /// Drop exceeds the threshold
    Triggered {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
    },
    /// Nothing hashed although the previous snapshot had units
    EmptyResult { previous_count: usize },
}

impl CircuitBreaker {
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self { config }
    }

    /// Compare the number of units hashed this run with the previous snapshot.
    pub fn check(&self, current_count: usize, previous_count: usize) -> CircuitBreakerResult {
        if !self.config.enabled {
            return CircuitBreakerResult::Disabled;
        }

        if current_count == 0 {
            if previous_count == 0 && self.config.allow_cold_start {
                return CircuitBreakerResult::ColdStart { current_count };
            }
            return CircuitBreakerResult::EmptyResult { previous_count };
        }

        if previous_count < self.config.min_baseline {
            return CircuitBreakerResult::ColdStart { current_count };
        }

        if current_count < previous_count {
            let drop = previous_count - current_count;
            let drop_percent = (drop as f64 / previous_count as f64) * 100.0;

            if drop_percent > self.config.max_drop_percent as f64 {
                return CircuitBreakerResult::Triggered {
                    current_count,
                    previous_count,
                    drop_percent,
                };
            }
        }

        CircuitBreakerResult::Safe {
            current_count,
            previous_count,
        }
    }

    /// Ok if the run may proceed, `CircuitBreakerTriggered` otherwise.
    pub fn validate(&self, current_count: usize, previous_count: usize) -> Result<()> {
        match self.check(current_count, previous_count) {
            CircuitBreakerResult::Disabled => Ok(()),
            CircuitBreakerResult::Safe {
                current_count,
                previous_count,
            } => {
                log::debug!(
                    "Circuit breaker: SAFE ({} units, was {})",
                    current_count,
                    previous_count
                );
                Ok(())
            }
            CircuitBreakerResult::ColdStart { current_count } => {
                log::info!(
                    "Circuit breaker: COLD START ({} units, first run or below baseline)",
                    current_count
                );
                Ok(())
            }
            CircuitBreakerResult::Triggered {
                current_count,
                previous_count,
                drop_percent,
            } => {
                log::error!(
                    "Circuit breaker: TRIGGERED! {} -> {} units ({:.1}% drop > {}% threshold)",
                    previous_count,
                    current_count,
                    drop_percent,
                    self.config.max_drop_percent
                );
                Err(AppError::CircuitBreakerTriggered {
                    current_count,
                    previous_count,
                    drop_percent,
                    threshold_percent: self.config.max_drop_percent,
                })
            }
            CircuitBreakerResult::EmptyResult { previous_count } => {
                log::error!("Circuit breaker: EMPTY RESULT ({} units before)", previous_count);
                Err(AppError::CircuitBreakerTriggered {
                    current_count: 0,
                    previous_count,
                    drop_percent: 100.0,
                    threshold_percent: self.config.max_drop_percent,
                })
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }
}
