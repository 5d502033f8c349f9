//! # Sentrade
//!
//! A news-driven, multi-strategy trading pipeline that shifts capital between
//! strategies according to their recent performance.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `portfolio`: Exponentially weighted capital allocator and its shared handle
//! - `strategy`: Strategy contract, mean-reversion and sentiment strategies
//! - `pipeline`: Period orchestration and scenario replay
//! - `utils`: Statistics and decimal helpers

pub mod config;
pub mod pipeline;
pub mod portfolio;
pub mod strategy;
pub mod utils;

pub use config::Config;
