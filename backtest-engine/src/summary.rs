//! Summary statistics over backtest results

use backtest_core::TradeResult;

/// Aggregate statistics for one backtest run
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSummary {
    /// Markets where a position was actually taken
    pub num_trades: usize,
    /// Wins (pnl > 0) over trades taken
    pub win_rate: f64,
    /// Mean PnL across all result rows, traded or not
    pub avg_pnl: f64,
    pub total_pnl: f64,
    /// Largest peak-to-trough equity drop, ≤ 0
    pub max_drawdown: f64,
}

impl TradeSummary {
    fn empty() -> Self {
        Self {
            num_trades: 0,
            win_rate: 0.0,
            avg_pnl: 0.0,
            total_pnl: 0.0,
            max_drawdown: 0.0,
        }
    }
}

/// Summarize per-market results in row order
///
/// The equity curve is the running PnL sum over the rows as given; the
/// drawdown at each row is equity minus the running maximum.
pub fn summarize_trades(results: &[TradeResult]) -> TradeSummary {
    if results.is_empty() {
        return TradeSummary::empty();
    }

    let num_trades = results.iter().filter(|r| r.side.is_some()).count();
    let wins = results.iter().filter(|r| r.pnl > 0.0).count();
    let win_rate = if num_trades > 0 {
        wins as f64 / num_trades as f64
    } else {
        0.0
    };

    let total_pnl: f64 = results.iter().map(|r| r.pnl).sum();
    let avg_pnl = total_pnl / results.len() as f64;

    let mut equity = 0.0_f64;
    let mut running_max = f64::NEG_INFINITY;
    let mut max_drawdown = f64::INFINITY;
    for result in results {
        equity += result.pnl;
        running_max = running_max.max(equity);
        max_drawdown = max_drawdown.min(equity - running_max);
    }

    TradeSummary {
        num_trades,
        win_rate,
        avg_pnl,
        total_pnl,
        max_drawdown,
    }
}
