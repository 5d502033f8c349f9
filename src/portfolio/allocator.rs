//! Exponentially weighted performance allocator.
//!
//! Keeps a normalized capital weight per strategy and moves it toward each
//! period's relative performance:
//!
//! ```text
//! reward(s) = perf(s) / sum(perf)
//! w(s)      = (1 - lr) * w(s) + lr * reward(s)
//! ```
//!
//! followed by renormalization so the weights sum to one.

use crate::config::AllocatorConfig;
use crate::portfolio::AllocationEntry;
use crate::utils::decimal::capital_budget;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Learning rate used when none is configured.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Invalid allocator or pipeline setup. Only raised at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("strategy set must not be empty")]
    EmptyStrategySet,

    #[error("duplicate strategy identifier: {0}")]
    DuplicateStrategy(String),

    #[error("learning rate must be in (0, 1], got {0}")]
    InvalidLearningRate(f64),

    #[error(
        "initial weights do not match strategy set (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    InitialWeightsMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("initial weight for {strategy} is not finite: {weight}")]
    InvalidInitialWeight { strategy: String, weight: f64 },

    #[error(
        "strategies do not match allocator set (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    StrategySetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Capital allocator over a fixed set of strategies.
#[derive(Debug, Clone)]
pub struct EwaAllocator {
    /// Strategy identifiers in configured order
    strategies: Vec<String>,
    /// Current weight per strategy
    weights: HashMap<String, f64>,
    /// Blend factor in (0, 1]
    learning_rate: f64,
    /// Clamp blended weights at zero before renormalizing
    clamp_negative: bool,
}

impl EwaAllocator {
    /// Create a new allocator.
    ///
    /// Explicit `initial_weights` must cover exactly the strategy set and are
    /// used as given; they are only normalized by the first effective update.
    pub fn new<I, S>(
        strategies: I,
        initial_weights: Option<HashMap<String, f64>>,
        learning_rate: Option<f64>,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let strategies: Vec<String> = strategies.into_iter().map(Into::into).collect();
        if strategies.is_empty() {
            return Err(ConfigurationError::EmptyStrategySet);
        }

        let mut seen = HashSet::new();
        for strategy in &strategies {
            if !seen.insert(strategy.as_str()) {
                return Err(ConfigurationError::DuplicateStrategy(strategy.clone()));
            }
        }

        let learning_rate = learning_rate.unwrap_or(DEFAULT_LEARNING_RATE);
        // NaN fails both comparisons
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(ConfigurationError::InvalidLearningRate(learning_rate));
        }

        let weights = match initial_weights {
            Some(weights) => {
                check_initial_weights(&strategies, &weights)?;
                weights
            }
            None => uniform_weights(&strategies),
        };

        debug!(
            strategies = strategies.len(),
            learning_rate,
            "Allocator initialized"
        );

        Ok(Self {
            strategies,
            weights,
            learning_rate,
            clamp_negative: false,
        })
    }

    /// Build an allocator for `strategies` from configuration.
    ///
    /// Each strategy may appear at most once in the configured initial weights.
    pub fn from_config<I, S>(
        strategies: I,
        config: &AllocatorConfig,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let initial_weights = match &config.initial_weights {
            Some(entries) => {
                let mut weights = HashMap::with_capacity(entries.len());
                for entry in entries {
                    if weights.insert(entry.strategy.clone(), entry.weight).is_some() {
                        return Err(ConfigurationError::DuplicateStrategy(
                            entry.strategy.clone(),
                        ));
                    }
                }
                Some(weights)
            }
            None => None,
        };

        Ok(
            Self::new(strategies, initial_weights, Some(config.learning_rate))?
                .with_negative_clamp(config.clamp_negative_weights),
        )
    }

    /// Clamp blended weights at zero so no strategy ends up with a short allocation.
    pub fn with_negative_clamp(mut self, clamp: bool) -> Self {
        self.clamp_negative = clamp;
        self
    }

    /// Apply one period of performance feedback.
    ///
    /// Strategies missing from `performance` count as zero; unknown keys are
    /// ignored. A zero (or non-finite) total leaves the weights untouched.
    pub fn update(&mut self, performance: &HashMap<String, f64>) {
        for key in performance.keys() {
            if !self.weights.contains_key(key) {
                debug!(strategy = %key, "Ignoring performance for unknown strategy");
            }
        }

        let total: f64 = self
            .strategies
            .iter()
            .map(|s| performance.get(s).copied().unwrap_or(0.0))
            .sum();

        if total == 0.0 {
            debug!("Total performance is zero, keeping current weights");
            return;
        }
        if !total.is_finite() {
            warn!(total, "Non-finite total performance, keeping current weights");
            return;
        }

        let lr = self.learning_rate;
        let blended: HashMap<String, f64> = self
            .strategies
            .iter()
            .map(|strategy| {
                let reward = performance.get(strategy).copied().unwrap_or(0.0) / total;
                let previous = self.weights.get(strategy).copied().unwrap_or(0.0);
                let mut weight = (1.0 - lr) * previous + lr * reward;
                if self.clamp_negative {
                    weight = weight.max(0.0);
                }
                (strategy.clone(), weight)
            })
            .collect();

        self.weights = self.normalized(blended);

        debug!(total, weights = ?self.weights, "Allocator weights updated");
    }

    /// Current weights as an owned map.
    pub fn allocations(&self) -> HashMap<String, f64> {
        self.weights.clone()
    }

    /// Current weights in configured order, sized against `capital`.
    pub fn entries(&self, capital: Decimal, precision: u32) -> Vec<AllocationEntry> {
        self.strategies
            .iter()
            .map(|strategy| {
                let weight = self.weights.get(strategy).copied().unwrap_or(0.0);
                AllocationEntry {
                    strategy: strategy.clone(),
                    weight,
                    capital_budget: capital_budget(capital, weight, precision),
                }
            })
            .collect()
    }

    /// Weight of a single strategy.
    pub fn weight(&self, strategy: &str) -> Option<f64> {
        self.weights.get(strategy).copied()
    }

    /// Strategy identifiers in configured order.
    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Scale weights to sum to one, or reset to uniform if they collapsed.
    fn normalized(&self, mut weights: HashMap<String, f64>) -> HashMap<String, f64> {
        let sum: f64 = self
            .strategies
            .iter()
            .map(|s| weights.get(s).copied().unwrap_or(0.0))
            .sum();

        if sum > 0.0 && sum.is_finite() {
            for weight in weights.values_mut() {
                *weight /= sum;
            }
            weights
        } else {
            warn!(sum, "Weight sum collapsed, falling back to uniform allocation");
            uniform_weights(&self.strategies)
        }
    }
}

fn uniform_weights(strategies: &[String]) -> HashMap<String, f64> {
    let weight = 1.0 / strategies.len() as f64;
    strategies.iter().map(|s| (s.clone(), weight)).collect()
}

fn check_initial_weights(
    strategies: &[String],
    weights: &HashMap<String, f64>,
) -> Result<(), ConfigurationError> {
    let mut missing: Vec<String> = strategies
        .iter()
        .filter(|s| !weights.contains_key(*s))
        .cloned()
        .collect();
    let mut unexpected: Vec<String> = weights
        .keys()
        .filter(|k| !strategies.contains(k))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        missing.sort();
        unexpected.sort();
        return Err(ConfigurationError::InitialWeightsMismatch {
            missing,
            unexpected,
        });
    }

    for strategy in strategies {
        let weight = weights[strategy];
        if !weight.is_finite() {
            return Err(ConfigurationError::InvalidInitialWeight {
                strategy: strategy.clone(),
                weight,
            });
        }
    }

    Ok(())
}
