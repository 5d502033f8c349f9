//! One-period mark-to-market of emitted signals.
//!
//! Every priced BUY/SELL signal opens a notional position at the signal
//! price. The next period's quote for the symbol closes it and realizes P&L.

use super::{MarketData, SignalAction, StrategyPerformance, TradingSignal};
use tracing::debug;

#[derive(Debug, Clone)]
struct OpenPosition {
    symbol: String,
    action: SignalAction,
    quantity: f64,
    entry_price: f64,
}

impl OpenPosition {
    fn pnl_at(&self, exit_price: f64) -> f64 {
        match self.action {
            SignalAction::Buy => self.quantity * (exit_price - self.entry_price),
            SignalAction::Sell => self.quantity * (self.entry_price - exit_price),
            SignalAction::Hold => 0.0,
        }
    }
}

/// Tracks realized P&L of a strategy's own signals.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    open: Vec<OpenPosition>,
    realized_pnl: f64,
    trades_executed: u64,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close every open position quoted in `data`.
    ///
    /// Returns the P&L realized by this call. Unquoted positions stay open.
    pub fn settle(&mut self, data: &MarketData) -> f64 {
        let mut realized = 0.0;
        let mut still_open = Vec::new();

        for position in std::mem::take(&mut self.open) {
            match data.current_price(&position.symbol) {
                Some(price) => {
                    let pnl = position.pnl_at(price);
                    debug!(
                        symbol = %position.symbol,
                        action = %position.action,
                        entry = position.entry_price,
                        exit = price,
                        pnl,
                        "Position settled"
                    );
                    realized += pnl;
                }
                None => still_open.push(position),
            }
        }

        self.open = still_open;
        self.realized_pnl += realized;
        realized
    }

    /// Open positions for every priced BUY/SELL signal.
    pub fn open_positions(&mut self, signals: &[TradingSignal]) {
        for signal in signals {
            if signal.action == SignalAction::Hold {
                continue;
            }
            let Some(price) = signal.price else {
                continue;
            };
            self.open.push(OpenPosition {
                symbol: signal.symbol.clone(),
                action: signal.action,
                quantity: signal.quantity,
                entry_price: price,
            });
            self.trades_executed += 1;
        }
    }

    pub fn snapshot(&self) -> StrategyPerformance {
        StrategyPerformance {
            pnl: self.realized_pnl,
            trades_executed: self.trades_executed,
            open_positions: self.open.len(),
        }
    }
}
