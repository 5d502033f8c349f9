//! Configuration management for the trading pipeline.
//!
//! Loads settings from an optional config file, `SENTRADE__*` environment
//! variables and a `.env` file.

use crate::portfolio::DEFAULT_LEARNING_RATE;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Capital allocator settings
    #[serde(default)]
    pub allocator: AllocatorConfig,
    /// Strategy instances; their names form the allocator's strategy set
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyConfig>,
    /// Period loop and capital sizing
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Blend factor toward each period's reward (0.0-1.0, exclusive of 0)
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Explicit starting weights; must name every strategy once. Used as given.
    #[serde(default)]
    pub initial_weights: Option<Vec<InitialWeight>>,
    /// Clamp blended weights at zero (no short allocations)
    #[serde(default)]
    pub clamp_negative_weights: bool,
}

/// Starting weight for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialWeight {
    /// Strategy identifier
    pub strategy: String,
    pub weight: f64,
}

impl InitialWeight {
    pub fn new(strategy: impl Into<String>, weight: f64) -> Self {
        Self {
            strategy: strategy.into(),
            weight,
        }
    }
}

/// A configured strategy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    MeanReversion(MeanReversionConfig),
    Sentiment(SentimentConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionConfig {
    /// Unique strategy identifier
    #[serde(default = "default_mean_reversion_name")]
    pub name: String,
    /// Number of trailing prices in the statistics window
    #[serde(default = "default_lookback_period")]
    pub lookback_period: usize,
    /// Z-score beyond which a signal fires
    #[serde(default = "default_std_dev_threshold")]
    pub std_dev_threshold: f64,
    /// Units per signal
    #[serde(default = "default_order_quantity")]
    pub order_quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Unique strategy identifier
    #[serde(default = "default_sentiment_name")]
    pub name: String,
    /// Scores strictly above this produce BUY signals
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    /// Scores strictly below this produce SELL signals
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,
    /// Units per signal
    #[serde(default = "default_order_quantity")]
    pub order_quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Total capital split across strategies
    #[serde(default = "default_capital")]
    pub capital: Decimal,
    /// Decimal places for per-strategy capital budgets
    #[serde(default = "default_budget_precision")]
    pub budget_precision: u32,
    /// Delay between replayed periods in milliseconds
    #[serde(default = "default_period_interval_ms")]
    pub period_interval_ms: u64,
}

// Default value functions
fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_strategies() -> Vec<StrategyConfig> {
    vec![
        StrategyConfig::Sentiment(SentimentConfig::default()),
        StrategyConfig::MeanReversion(MeanReversionConfig::default()),
    ]
}

fn default_mean_reversion_name() -> String {
    "MeanReversionStrategy".to_string()
}

fn default_sentiment_name() -> String {
    "SentimentStrategy".to_string()
}

fn default_lookback_period() -> usize {
    20
}

fn default_std_dev_threshold() -> f64 {
    2.0
}

fn default_order_quantity() -> f64 {
    10.0
}

fn default_positive_threshold() -> f64 {
    0.6
}

fn default_negative_threshold() -> f64 {
    -0.6
}

fn default_capital() -> Decimal {
    Decimal::new(100_000, 0) // 100k
}

fn default_budget_precision() -> u32 {
    2
}

fn default_period_interval_ms() -> u64 {
    1_000
}

impl StrategyConfig {
    /// Strategy identifier.
    pub fn name(&self) -> &str {
        match self {
            StrategyConfig::MeanReversion(c) => &c.name,
            StrategyConfig::Sentiment(c) => &c.name,
        }
    }
}

impl Config {
    /// Load configuration from `config.*` and environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load configuration from the named file (extension optional) and environment variables.
    pub fn load_from(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::default().separator("__").prefix("SENTRADE"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Strategy identifiers in configured order.
    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.strategies.is_empty(),
            "at least one strategy must be configured"
        );

        let mut names = HashSet::new();
        for strategy in &self.strategies {
            anyhow::ensure!(
                names.insert(strategy.name()),
                "duplicate strategy name: {}",
                strategy.name()
            );
            strategy.validate()?;
        }

        anyhow::ensure!(
            self.allocator.learning_rate > 0.0 && self.allocator.learning_rate <= 1.0,
            "learning_rate must be in (0, 1]"
        );

        if let Some(weights) = &self.allocator.initial_weights {
            let mut configured = HashSet::new();
            for entry in weights {
                anyhow::ensure!(
                    configured.insert(entry.strategy.as_str()),
                    "duplicate initial weight for {}",
                    entry.strategy
                );
            }
            anyhow::ensure!(
                configured == names,
                "initial_weights must name exactly the configured strategies"
            );
        }

        anyhow::ensure!(
            self.pipeline.capital >= Decimal::ZERO,
            "capital must not be negative"
        );

        Ok(())
    }
}

impl StrategyConfig {
    fn validate(&self) -> Result<()> {
        match self {
            StrategyConfig::MeanReversion(c) => {
                anyhow::ensure!(
                    c.lookback_period >= 2,
                    "{}: lookback_period must be at least 2",
                    c.name
                );
                anyhow::ensure!(
                    c.std_dev_threshold.is_finite() && c.std_dev_threshold >= 0.0,
                    "{}: std_dev_threshold must be a non-negative number",
                    c.name
                );
                anyhow::ensure!(
                    c.order_quantity > 0.0,
                    "{}: order_quantity must be positive",
                    c.name
                );
            }
            StrategyConfig::Sentiment(c) => {
                anyhow::ensure!(
                    c.negative_threshold < c.positive_threshold,
                    "{}: negative_threshold must be below positive_threshold",
                    c.name
                );
                anyhow::ensure!(
                    c.order_quantity > 0.0,
                    "{}: order_quantity must be positive",
                    c.name
                );
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allocator: AllocatorConfig::default(),
            strategies: default_strategies(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            initial_weights: None,
            clamp_negative_weights: false,
        }
    }
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            name: default_mean_reversion_name(),
            lookback_period: default_lookback_period(),
            std_dev_threshold: default_std_dev_threshold(),
            order_quantity: default_order_quantity(),
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            name: default_sentiment_name(),
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
            order_quantity: default_order_quantity(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capital: default_capital(),
            budget_precision: default_budget_precision(),
            period_interval_ms: default_period_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::EwaAllocator;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.strategy_names(),
            vec!["SentimentStrategy", "MeanReversionStrategy"]
        );
    }

    #[test]
    fn test_duplicate_strategy_names_rejected() {
        let mut config = Config::default();
        config
            .strategies
            .push(StrategyConfig::Sentiment(SentimentConfig::default()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_learning_rate_out_of_range_rejected() {
        let mut config = Config::default();
        config.allocator.learning_rate = 0.0;
        assert!(config.validate().is_err());

        config.allocator.learning_rate = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initial_weights_must_match_strategies() {
        let mut config = Config::default();
        config.allocator.initial_weights = Some(vec![InitialWeight::new("SentimentStrategy", 1.0)]);
        assert!(config.validate().is_err());

        config.allocator.initial_weights = Some(vec![
            InitialWeight::new("SentimentStrategy", 0.7),
            InitialWeight::new("MeanReversionStrategy", 0.3),
        ]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_initial_weight_rejected() {
        let mut config = Config::default();
        config.allocator.initial_weights = Some(vec![
            InitialWeight::new("SentimentStrategy", 0.5),
            InitialWeight::new("SentimentStrategy", 0.2),
            InitialWeight::new("MeanReversionStrategy", 0.3),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_keeps_strategy_name_case() {
        let path = std::env::temp_dir().join(format!(
            "sentrade-config-{}.toml",
            std::process::id()
        ));
        let toml = r#"
[allocator]
learning_rate = 0.2
initial_weights = [
    { strategy = "SentimentStrategy", weight = 0.7 },
    { strategy = "MeanReversionStrategy", weight = 0.3 },
]

[[strategies]]
kind = "sentiment"

[[strategies]]
kind = "mean_reversion"
lookback_period = 10
"#;
        std::fs::write(&path, toml).unwrap();

        let loaded = Config::load_from(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        let config = loaded.unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.allocator.learning_rate, 0.2);
        assert_eq!(
            config.allocator.initial_weights,
            Some(vec![
                InitialWeight::new("SentimentStrategy", 0.7),
                InitialWeight::new("MeanReversionStrategy", 0.3),
            ])
        );

        let allocator =
            EwaAllocator::from_config(config.strategy_names(), &config.allocator).unwrap();
        assert_eq!(allocator.weight("SentimentStrategy"), Some(0.7));
        assert_eq!(allocator.weight("MeanReversionStrategy"), Some(0.3));
    }

    #[test]
    fn test_sentiment_thresholds_ordered() {
        let mut config = Config::default();
        config.strategies = vec![StrategyConfig::Sentiment(SentimentConfig {
            positive_threshold: -0.5,
            negative_threshold: 0.5,
            ..SentimentConfig::default()
        })];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategies_deserialize_with_defaults() {
        let json = r#"{
            "allocator": { "learning_rate": 0.25 },
            "strategies": [
                { "kind": "mean_reversion", "name": "MR-Fast", "lookback_period": 10 },
                { "kind": "sentiment" }
            ]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.allocator.learning_rate, 0.25);
        assert_eq!(config.strategy_names(), vec!["MR-Fast", "SentimentStrategy"]);

        match &config.strategies[0] {
            StrategyConfig::MeanReversion(c) => {
                assert_eq!(c.lookback_period, 10);
                assert_eq!(c.std_dev_threshold, 2.0);
            }
            other => panic!("unexpected strategy config: {other:?}"),
        }
        assert_eq!(config.pipeline.capital, Decimal::new(100_000, 0));
    }
}
