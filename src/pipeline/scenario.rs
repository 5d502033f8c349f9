//! Replayable sequences of market data periods.

use crate::strategy::{Article, MarketData, PriceSeries};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered periods of market data fed through the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub periods: Vec<MarketData>,
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario file {}", path.display()))
    }

    /// Three daily periods with one mean-reversion trade and two news-driven trades.
    pub fn demo() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 6, 14, 30, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let base = [100.0, 101.0, 99.0, 100.0, 102.0, 98.0, 100.0, 101.0, 99.0, 100.0];
        let mut xcorp: Vec<f64> = base.iter().chain(base.iter()).copied().collect();

        let mut periods = Vec::new();

        // Period 1: XCORP drops well below its mean, AAPL and MSFT make the news
        periods.push(
            MarketData::new(start)
                .with_series("XCORP", PriceSeries::new(xcorp.clone(), 96.0))
                .with_series("AAPL", PriceSeries::new(vec![150.0, 151.0, 149.0, 150.0], 150.0))
                .with_series("MSFT", PriceSeries::new(vec![300.0, 301.0, 299.0], 300.0))
                .with_article(article(
                    "news1",
                    start,
                    "Apple beats expectations on services growth",
                    0.8,
                    &["AAPL"],
                ))
                .with_article(article(
                    "news2",
                    start,
                    "Microsoft faces antitrust probe",
                    -0.7,
                    &["MSFT"],
                )),
        );

        // Period 2: XCORP reverts, sentiment trades are mixed
        xcorp.remove(0);
        xcorp.push(96.0);
        let day_2 = start + Duration::days(1);
        periods.push(
            MarketData::new(day_2)
                .with_series("XCORP", PriceSeries::new(xcorp.clone(), 99.0))
                .with_series("AAPL", PriceSeries::new(vec![151.0, 149.0, 150.0, 150.0], 148.0))
                .with_series("MSFT", PriceSeries::new(vec![301.0, 299.0, 300.0], 299.0))
                .with_article(article(
                    "news3",
                    day_2,
                    "Alphabet holds steady ahead of earnings",
                    0.2,
                    &["GOOG"],
                )),
        );

        // Period 3: quiet tape, one bullish headline
        xcorp.remove(0);
        xcorp.push(99.0);
        let day_3 = start + Duration::days(2);
        periods.push(
            MarketData::new(day_3)
                .with_series("XCORP", PriceSeries::new(xcorp, 101.0))
                .with_series("AAPL", PriceSeries::new(vec![149.0, 150.0, 150.0, 148.0], 151.0))
                .with_series("MSFT", PriceSeries::new(vec![299.0, 300.0, 299.0], 297.0))
                .with_article(article(
                    "news4",
                    day_3,
                    "Microsoft cloud revenue surges",
                    0.75,
                    &["MSFT"],
                )),
        );

        Self { periods }
    }
}

fn article(
    id: &str,
    published: DateTime<Utc>,
    title: &str,
    sentiment_score: f64,
    mentions: &[&str],
) -> Article {
    Article {
        id: Some(id.to_string()),
        source: "demo".to_string(),
        url: format!("https://news.example.com/{id}"),
        title: title.to_string(),
        content: title.to_string(),
        publish_date: Some(published),
        sentiment_score: Some(sentiment_score),
        stock_mentions: mentions.iter().map(|s| s.to_string()).collect(),
    }
}
