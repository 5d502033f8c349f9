//! Trading strategies.
//!
//! Contains:
//! - The `Strategy` contract consumed by the pipeline
//! - Mean-reversion signal generation
//! - Sentiment threshold signal generation
//! - Per-strategy performance tracking

mod mean_reversion;
mod performance;
mod sentiment;
mod types;

pub use mean_reversion::MeanReversionStrategy;
pub use performance::PerformanceTracker;
pub use sentiment::SentimentStrategy;
pub use types::{
    Article, MarketData, PriceSeries, SignalAction, StrategyPerformance, TradingSignal,
};

use crate::config::StrategyConfig;

/// A pluggable signal-generation unit evaluated by periodic performance feedback.
pub trait Strategy: Send {
    /// Unique strategy identifier.
    fn name(&self) -> &str;

    /// Produce trading signals for one period of data.
    fn generate_signals(&mut self, data: &MarketData) -> Vec<TradingSignal>;

    /// Cumulative performance since the strategy started.
    fn performance(&self) -> StrategyPerformance;
}

/// Instantiate the strategy described by `config`.
pub fn build_strategy(config: &StrategyConfig) -> Box<dyn Strategy> {
    match config {
        StrategyConfig::MeanReversion(c) => Box::new(MeanReversionStrategy::new(c.clone())),
        StrategyConfig::Sentiment(c) => Box::new(SentimentStrategy::new(c.clone())),
    }
}
