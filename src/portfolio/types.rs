//! Boundary records exchanged with the strategy and execution layers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One period's performance value for a strategy (higher is better).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    /// Strategy identifier
    pub strategy: String,
    /// Realized P&L (or any sign-bearing score) for the period
    pub value: f64,
}

impl PerformanceMetric {
    pub fn new(strategy: impl Into<String>, value: f64) -> Self {
        Self {
            strategy: strategy.into(),
            value,
        }
    }
}

/// Current capital allocation for a single strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Strategy identifier
    pub strategy: String,
    /// Fraction of total capital (sums to 1 across entries)
    pub weight: f64,
    /// Weight applied to the configured capital
    pub capital_budget: Decimal,
}
