//! Sentiment threshold strategy.
//!
//! Consumes articles scored upstream and trades the tickers they mention
//! when the score is decisively positive or negative.

use super::{
    MarketData, PerformanceTracker, SignalAction, Strategy, StrategyPerformance, TradingSignal,
};
use crate::config::SentimentConfig;
use std::collections::HashSet;
use tracing::{debug, info};

pub struct SentimentStrategy {
    config: SentimentConfig,
    tracker: PerformanceTracker,
}

impl SentimentStrategy {
    pub fn new(config: SentimentConfig) -> Self {
        Self {
            config,
            tracker: PerformanceTracker::new(),
        }
    }

    fn action_for(&self, score: f64) -> Option<SignalAction> {
        if score > self.config.positive_threshold {
            Some(SignalAction::Buy)
        } else if score < self.config.negative_threshold {
            Some(SignalAction::Sell)
        } else {
            None
        }
    }
}

impl Strategy for SentimentStrategy {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn generate_signals(&mut self, data: &MarketData) -> Vec<TradingSignal> {
        let realized = self.tracker.settle(data);
        debug!(strategy = %self.config.name, realized, "Period settled");

        let mut signals = Vec::new();
        // First article wins for each (symbol, action) within a period
        let mut seen: HashSet<(String, SignalAction)> = HashSet::new();

        for article in &data.articles {
            let Some(score) = article.sentiment_score else {
                continue;
            };
            let Some(action) = self.action_for(score) else {
                continue;
            };

            for symbol in &article.stock_mentions {
                if !seen.insert((symbol.clone(), action)) {
                    continue;
                }
                signals.push(TradingSignal {
                    strategy_name: self.config.name.clone(),
                    symbol: symbol.clone(),
                    action,
                    quantity: self.config.order_quantity,
                    price: data.current_price(symbol),
                    confidence: Some(score.abs().min(1.0)),
                    reason: format!("Sentiment {score:.2} on \"{}\"", article.title),
                    source_article_id: article.id.clone(),
                    timestamp: data.timestamp,
                });
            }
        }

        self.tracker.open_positions(&signals);

        if !signals.is_empty() {
            info!(
                strategy = %self.config.name,
                signals = signals.len(),
                "Sentiment signals generated"
            );
        }

        signals
    }

    fn performance(&self) -> StrategyPerformance {
        self.tracker.snapshot()
    }
}
