//! Mean-reversion signal generation.
//!
//! Bets that prices revert to their recent mean: a quote far below the
//! rolling mean is bought, far above is sold.

use super::{
    MarketData, PerformanceTracker, PriceSeries, SignalAction, Strategy, StrategyPerformance,
    TradingSignal,
};
use crate::config::MeanReversionConfig;
use crate::utils::stats;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Z-score based mean-reversion strategy.
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
    tracker: PerformanceTracker,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self {
            config,
            tracker: PerformanceTracker::new(),
        }
    }

    /// Evaluate one symbol against its trailing window.
    ///
    /// Returns `None` without a current quote, with fewer than
    /// `lookback_period` prices, with a flat window, or inside the threshold.
    pub fn evaluate(
        &self,
        symbol: &str,
        series: &PriceSeries,
        timestamp: DateTime<Utc>,
    ) -> Option<TradingSignal> {
        let current = series.current_price?;
        let lookback = self.config.lookback_period;
        if series.prices.len() < lookback {
            return None;
        }

        let window = &series.prices[series.prices.len() - lookback..];
        let mean = stats::mean(window)?;
        let std_dev = stats::population_std_dev(window)?;
        let z = stats::z_score(current, mean, std_dev)?;

        let threshold = self.config.std_dev_threshold;
        let (action, reason) = if z < -threshold {
            (
                SignalAction::Buy,
                format!(
                    "Price {current} is {:.2} std devs below mean {mean:.2}",
                    -z
                ),
            )
        } else if z > threshold {
            (
                SignalAction::Sell,
                format!("Price {current} is {z:.2} std devs above mean {mean:.2}"),
            )
        } else {
            return None;
        };

        Some(TradingSignal {
            strategy_name: self.config.name.clone(),
            symbol: symbol.to_string(),
            action,
            quantity: self.config.order_quantity,
            price: Some(current),
            confidence: None,
            reason,
            source_article_id: None,
            timestamp,
        })
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn generate_signals(&mut self, data: &MarketData) -> Vec<TradingSignal> {
        let realized = self.tracker.settle(data);

        let mut symbols: Vec<&String> = data.prices.keys().collect();
        symbols.sort();

        let signals: Vec<TradingSignal> = symbols
            .into_iter()
            .filter_map(|symbol| self.evaluate(symbol, &data.prices[symbol], data.timestamp))
            .collect();

        self.tracker.open_positions(&signals);

        if !signals.is_empty() {
            info!(
                strategy = %self.config.name,
                signals = signals.len(),
                "Mean-reversion signals generated"
            );
        }
        debug!(strategy = %self.config.name, realized, "Period settled");

        signals
    }

    fn performance(&self) -> StrategyPerformance {
        self.tracker.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn strategy(lookback_period: usize, std_dev_threshold: f64) -> MeanReversionStrategy {
        MeanReversionStrategy::new(MeanReversionConfig {
            name: "MR".to_string(),
            lookback_period,
            std_dev_threshold,
            order_quantity: 10.0,
        })
    }

    fn repeated(pattern: &[f64], times: usize) -> Vec<f64> {
        pattern.iter().copied().cycle().take(pattern.len() * times).collect()
    }

    fn sample_market() -> MarketData {
        MarketData::new(Utc::now())
            .with_series(
                "AAPL",
                PriceSeries::new(
                    repeated(
                        &[150.0, 151.0, 152.0, 153.0, 150.0, 148.0, 147.0, 145.0, 146.0, 144.0],
                        5,
                    ),
                    130.0,
                ),
            )
            .with_series(
                "MSFT",
                PriceSeries::new(
                    repeated(
                        &[200.0, 201.0, 202.0, 203.0, 204.0, 205.0, 206.0, 207.0, 208.0, 209.0],
                        5,
                    ),
                    220.0,
                ),
            )
            .with_series(
                "GOOG",
                PriceSeries::new(repeated(&[1000.0, 1001.0], 25), 1000.5),
            )
    }

    // =========================================================================
    // Signal Tests
    // =========================================================================

    #[test]
    fn test_signals_for_outliers_only() {
        let mut strategy = strategy(50, 2.5);
        let signals = strategy.generate_signals(&sample_market());

        // Sorted by symbol; GOOG sits on its mean
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].symbol, "AAPL");
        assert_eq!(signals[0].action, SignalAction::Buy);
        assert_eq!(signals[0].price, Some(130.0));
        assert_eq!(signals[1].symbol, "MSFT");
        assert_eq!(signals[1].action, SignalAction::Sell);
        assert!(signals.iter().all(|s| s.strategy_name == "MR"));
        assert!(signals.iter().all(|s| s.quantity == 10.0));
    }

    #[test]
    fn test_uses_trailing_window_only() {
        let strategy = strategy(3, 1.0);

        // Old prices far away are outside the window: mean 10, std ~0.816
        let mut prices = vec![1000.0; 10];
        prices.extend([9.0, 10.0, 11.0]);
        let signal = strategy
            .evaluate("X", &PriceSeries::new(prices, 12.0), Utc::now())
            .unwrap();

        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.reason.contains("above mean 10.00"));
    }

    #[test]
    fn test_short_history_skipped() {
        let strategy = strategy(20, 2.0);
        let series = PriceSeries::new(vec![100.0; 19], 50.0);
        assert!(strategy.evaluate("X", &series, Utc::now()).is_none());
    }

    #[test]
    fn test_missing_quote_skipped() {
        let strategy = strategy(3, 2.0);
        let series = PriceSeries {
            prices: vec![1.0, 2.0, 3.0],
            current_price: None,
        };
        assert!(strategy.evaluate("X", &series, Utc::now()).is_none());
    }

    #[test]
    fn test_flat_prices_skipped() {
        let strategy = strategy(5, 2.0);
        let series = PriceSeries::new(vec![100.0; 5], 150.0);
        assert!(strategy.evaluate("X", &series, Utc::now()).is_none());
    }

    #[test]
    fn test_threshold_is_strict() {
        // window [9, 11]: mean 10, std 1 -> z = 2.0 exactly
        let strategy = strategy(2, 2.0);
        let series = PriceSeries::new(vec![9.0, 11.0], 12.0);
        assert!(strategy.evaluate("X", &series, Utc::now()).is_none());

        let series = PriceSeries::new(vec![9.0, 11.0], 12.5);
        assert!(strategy.evaluate("X", &series, Utc::now()).is_some());
    }

    // =========================================================================
    // Performance Tests
    // =========================================================================

    #[test]
    fn test_performance_realized_next_period() {
        let mut strategy = strategy(50, 2.5);
        strategy.generate_signals(&sample_market());
        assert_eq!(strategy.performance().trades_executed, 2);
        assert_eq!(strategy.performance().pnl, 0.0);

        // AAPL reverts up (+10 * 10), MSFT reverts down (+10 * 5)
        let next = MarketData::new(Utc::now())
            .with_series("AAPL", PriceSeries::new(Vec::new(), 140.0))
            .with_series("MSFT", PriceSeries::new(Vec::new(), 215.0));
        let signals = strategy.generate_signals(&next);

        assert!(signals.is_empty());
        assert_eq!(strategy.performance().pnl, 150.0);
        assert_eq!(strategy.performance().open_positions, 0);
    }
}
