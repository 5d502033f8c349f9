//! Records flowing into and out of strategies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "BUY"),
            SignalAction::Sell => write!(f, "SELL"),
            SignalAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// A per-symbol trade intent produced by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    /// Strategy that produced the signal
    pub strategy_name: String,
    pub symbol: String,
    pub action: SignalAction,
    pub quantity: f64,
    /// Reference price at signal time, if the symbol was quoted
    pub price: Option<f64>,
    /// Strategy confidence in [0, 1]
    pub confidence: Option<f64>,
    /// Human-readable rationale
    pub reason: String,
    /// Article that triggered the signal
    pub source_article_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A news article with sentiment already scored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    /// Sentiment in [-1, 1]; `None` if the article was not scored
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    /// Tickers mentioned in the article
    #[serde(default)]
    pub stock_mentions: Vec<String>,
}

/// Price history and latest quote for a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Historical prices, oldest first
    #[serde(default)]
    pub prices: Vec<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl PriceSeries {
    pub fn new(prices: Vec<f64>, current_price: f64) -> Self {
        Self {
            prices,
            current_price: Some(current_price),
        }
    }
}

/// Everything strategies see for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Price series keyed by symbol
    #[serde(default)]
    pub prices: HashMap<String, PriceSeries>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl MarketData {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            prices: HashMap::new(),
            articles: Vec::new(),
        }
    }

    pub fn with_series(mut self, symbol: impl Into<String>, series: PriceSeries) -> Self {
        self.prices.insert(symbol.into(), series);
        self
    }

    pub fn with_article(mut self, article: Article) -> Self {
        self.articles.push(article);
        self
    }

    /// Latest quote for `symbol`.
    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).and_then(|s| s.current_price)
    }
}

/// Cumulative performance reported by a strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    /// Realized P&L since the strategy started
    pub pnl: f64,
    /// Positions opened from signals
    pub trades_executed: u64,
    /// Positions still waiting for a settlement price
    pub open_positions: usize,
}
