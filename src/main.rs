//! Sentrade - Main Entry Point
//!
//! Replays market data periods through the strategies and the capital
//! allocator, or applies one-off allocator updates from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentrade::config::Config;
use sentrade::pipeline::{PeriodReport, Scenario, TradingPipeline};
use sentrade::portfolio::EwaAllocator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Level, Subscriber};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Sentrade CLI
#[derive(Parser)]
#[command(name = "sentrade")]
#[command(version, about = "News-driven multi-strategy trading pipeline")]
struct Cli {
    /// Configuration file name, extension optional (default: `config.*`)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit console logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay market data periods through strategies and allocator
    Run {
        /// Path to a JSON scenario file (built-in demo if omitted)
        #[arg(short, long)]
        scenario: Option<String>,

        /// Write all period reports to this JSON file
        #[arg(short, long)]
        output: Option<String>,

        /// Delay between periods in milliseconds (overrides config)
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },

    /// Apply one performance update to a freshly configured allocator
    Update {
        /// Strategy performance as NAME=VALUE (repeatable)
        #[arg(short, long = "perf", value_parser = parse_performance)]
        performance: Vec<(String, f64)>,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logging(cli.json_logs)?;

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    match cli.command {
        Some(Commands::Run {
            scenario,
            output,
            interval_ms,
        }) => run_pipeline(&config, scenario.as_deref(), output.as_deref(), interval_ms).await,
        Some(Commands::Update { performance }) => run_update(&config, performance),
        Some(Commands::ShowConfig) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        None => run_pipeline(&config, None, None, None).await,
    }
}

/// Replay a scenario period by period until it ends or Ctrl-C is received.
async fn run_pipeline(
    config: &Config,
    scenario_path: Option<&str>,
    output: Option<&str>,
    interval_ms: Option<u64>,
) -> Result<()> {
    info!(
        "Sentrade v{} - multi-strategy allocation pipeline",
        env!("CARGO_PKG_VERSION")
    );
    log_config(config);

    let scenario = match scenario_path {
        Some(path) => Scenario::from_file(path)?,
        None => {
            info!("No scenario file given, replaying built-in demo");
            Scenario::demo()
        }
    };
    if scenario.periods.is_empty() {
        warn!("Scenario contains no periods");
    }

    let mut pipeline = TradingPipeline::from_config(config)?;
    let allocator = pipeline.allocator();

    // Shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    let interval = interval_ms.unwrap_or(config.pipeline.period_interval_ms).max(1);
    let mut ticker = tokio::time::interval(Duration::from_millis(interval));

    info!(periods = scenario.periods.len(), interval_ms = interval, "Starting replay");

    let mut reports = Vec::with_capacity(scenario.periods.len());
    for data in &scenario.periods {
        ticker.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            warn!(
                completed = pipeline.periods_run(),
                "Stopping replay before scenario end"
            );
            break;
        }

        let report = pipeline.run_period(data);
        log_report(&report);
        reports.push(report);
    }

    info!("Final allocations:");
    for entry in allocator.entries(config.pipeline.capital, config.pipeline.budget_precision) {
        info!(
            "   {:<24} {:>6.2}%  ${}",
            entry.strategy,
            entry.weight * 100.0,
            entry.capital_budget
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write reports to {path}"))?;
        info!(path, reports = reports.len(), "Reports written");
    }

    Ok(())
}

/// Build the configured allocator, apply one update and print the result.
fn run_update(config: &Config, performance: Vec<(String, f64)>) -> Result<()> {
    let mut allocator = EwaAllocator::from_config(config.strategy_names(), &config.allocator)?;

    let performance: HashMap<String, f64> = performance.into_iter().collect();
    debug!(?performance, "Applying performance update");
    allocator.update(&performance);

    let entries = allocator.entries(config.pipeline.capital, config.pipeline.budget_precision);
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// Parse a `NAME=VALUE` performance argument.
fn parse_performance(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing strategy name in `{raw}`"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid performance value in `{raw}`: {e}"))?;
    Ok((name.to_string(), value))
}

/// Initialize logging to stdout and an hourly rolling file.
fn init_logging(json: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // File appender for detailed logs
    let file_appender = tracing_appender::rolling::hourly("logs", "sentrade.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep it alive for the program duration
    Box::leak(Box::new(_guard));

    let filter = EnvFilter::from_default_env()
        .add_directive("sentrade=debug".parse()?)
        .add_directive(Level::INFO.into());

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE);
    let stdout_layer = if json {
        stdout_layer.json().boxed()
    } else {
        stdout_layer.with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer(file_writer))
        .init();

    Ok(())
}

/// Plain-text layer for log files, never carrying color codes.
fn file_layer<S, W>(writer: W) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("Configuration:");
    info!("   Strategies: {}", config.strategy_names().join(", "));
    info!("   Learning Rate: {}", config.allocator.learning_rate);
    info!(
        "   Initial Weights: {}",
        if config.allocator.initial_weights.is_some() {
            "explicit"
        } else {
            "uniform"
        }
    );
    info!(
        "   Clamp Negative Weights: {}",
        config.allocator.clamp_negative_weights
    );
    info!("   Capital: ${}", config.pipeline.capital);
}

/// Log a one-line summary per signal and allocation.
fn log_report(report: &PeriodReport) {
    info!(
        "━━━ Period {} ({}) ━━━",
        report.period,
        report.timestamp.format("%Y-%m-%d %H:%M")
    );
    for signal in &report.signals {
        info!(
            "   [{}] {} {} x{} - {}",
            signal.strategy_name, signal.action, signal.symbol, signal.quantity, signal.reason
        );
    }
    for metric in &report.performance {
        info!("   P&L {:<24} {:>+10.2}", metric.strategy, metric.value);
    }
    for entry in &report.allocations {
        info!(
            "   Weight {:<21} {:>6.2}%  ${}",
            entry.strategy,
            entry.weight * 100.0,
            entry.capital_budget
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_file_layer_writes_plain_text() {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(file_layer(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            warn!(strategy = "SentimentStrategy", "Weight sum collapsed");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Weight sum collapsed"));
        assert!(output.contains("SentimentStrategy"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_parse_performance() {
        assert_eq!(
            parse_performance("SentimentStrategy=0.02"),
            Ok(("SentimentStrategy".to_string(), 0.02))
        );
        assert_eq!(
            parse_performance(" M = -1.5 "),
            Ok(("M".to_string(), -1.5))
        );
        assert!(parse_performance("no-equals").is_err());
        assert!(parse_performance("=1.0").is_err());
        assert!(parse_performance("S=abc").is_err());
    }

    #[test]
    fn test_cli_parses_update_arguments() {
        let cli = Cli::try_parse_from(["sentrade", "update", "--perf", "A=1", "-p", "B=-2"]).unwrap();
        match cli.command {
            Some(Commands::Update { performance }) => {
                assert_eq!(
                    performance,
                    vec![("A".to_string(), 1.0), ("B".to_string(), -2.0)]
                );
            }
            _ => panic!("expected update command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_config_flag_is_global() {
        let cli = Cli::try_parse_from(["sentrade", "show-config", "--config", "prod.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
        assert!(matches!(cli.command, Some(Commands::ShowConfig)));
    }
}
