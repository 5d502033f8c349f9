//! Period-by-period orchestration of strategies and the capital allocator.
//!
//! Each period:
//! 1. every strategy turns the period's market data into signals
//! 2. per-strategy P&L realized since the previous period is collected
//! 3. the allocator is updated with those deltas
//! 4. a `PeriodReport` captures signals, performance and new allocations

mod scenario;

pub use scenario::Scenario;

use crate::config::Config;
use crate::portfolio::{
    AllocationEntry, ConfigurationError, EwaAllocator, PerformanceMetric, SharedAllocator,
};
use crate::strategy::{build_strategy, MarketData, Strategy, TradingSignal};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Outcome of one pipeline period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReport {
    /// 1-based period counter
    pub period: u64,
    pub timestamp: DateTime<Utc>,
    pub signals: Vec<TradingSignal>,
    /// P&L each strategy realized during this period
    pub performance: Vec<PerformanceMetric>,
    /// Allocations after the update
    pub allocations: Vec<AllocationEntry>,
}

/// Drives strategies and feeds their performance into the allocator.
pub struct TradingPipeline {
    strategies: Vec<Box<dyn Strategy>>,
    allocator: SharedAllocator,
    capital: Decimal,
    budget_precision: u32,
    /// Cumulative P&L per strategy at the end of the previous period
    last_pnl: HashMap<String, f64>,
    period: u64,
}

impl TradingPipeline {
    /// Create a pipeline.
    ///
    /// Strategy names must match the allocator's strategy set exactly.
    pub fn new(
        strategies: Vec<Box<dyn Strategy>>,
        allocator: SharedAllocator,
        capital: Decimal,
        budget_precision: u32,
    ) -> Result<Self, ConfigurationError> {
        let mut names = HashSet::new();
        for strategy in &strategies {
            if !names.insert(strategy.name().to_string()) {
                return Err(ConfigurationError::DuplicateStrategy(
                    strategy.name().to_string(),
                ));
            }
        }

        let allocated: HashSet<String> = allocator.strategies().into_iter().collect();
        if names != allocated {
            let mut missing: Vec<String> = allocated.difference(&names).cloned().collect();
            let mut unexpected: Vec<String> = names.difference(&allocated).cloned().collect();
            missing.sort();
            unexpected.sort();
            return Err(ConfigurationError::StrategySetMismatch {
                missing,
                unexpected,
            });
        }

        let last_pnl = strategies
            .iter()
            .map(|s| (s.name().to_string(), s.performance().pnl))
            .collect();

        Ok(Self {
            strategies,
            allocator,
            capital,
            budget_precision,
            last_pnl,
            period: 0,
        })
    }

    /// Build strategies and allocator from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigurationError> {
        let strategies = config.strategies.iter().map(build_strategy).collect();
        let allocator = EwaAllocator::from_config(config.strategy_names(), &config.allocator)?;

        Self::new(
            strategies,
            SharedAllocator::new(allocator),
            config.pipeline.capital,
            config.pipeline.budget_precision,
        )
    }

    /// Handle to the allocator for concurrent readers.
    pub fn allocator(&self) -> SharedAllocator {
        self.allocator.clone()
    }

    /// Number of periods run so far.
    pub fn periods_run(&self) -> u64 {
        self.period
    }

    /// Run one period of data through strategies and allocator.
    pub fn run_period(&mut self, data: &MarketData) -> PeriodReport {
        self.period += 1;

        let mut signals = Vec::new();
        let mut performance = Vec::with_capacity(self.strategies.len());

        for strategy in &mut self.strategies {
            signals.extend(strategy.generate_signals(data));

            let name = strategy.name().to_string();
            let cumulative = strategy.performance().pnl;
            let previous = self.last_pnl.insert(name.clone(), cumulative).unwrap_or(0.0);
            performance.push(PerformanceMetric::new(name, cumulative - previous));
        }

        let feedback: HashMap<String, f64> = performance
            .iter()
            .map(|m| (m.strategy.clone(), m.value))
            .collect();
        debug!(period = self.period, ?feedback, "Updating allocator");
        self.allocator.update(&feedback);

        let allocations = self.allocator.entries(self.capital, self.budget_precision);

        info!(
            period = self.period,
            signals = signals.len(),
            "Period complete"
        );

        PeriodReport {
            period: self.period,
            timestamp: data.timestamp,
            signals,
            performance,
            allocations,
        }
    }
}
