//! Domain error types for the trading core.
//!
//! Two families matter here. Fatal configuration errors (negative cash,
//! oversold holdings, zero-quantity orders) indicate a bug in the strategy or
//! bad input data; they are never retried and bubble straight to the top of
//! the run. End-of-scenario is not a fault at all: it is the normal
//! termination signal of a backtest, carried as an error value so that it
//! propagates through the same channels.
//!
//! Scheduling invariant violations are deliberately *not* represented here;
//! those are programming bugs and abort via panic with diagnostic state.

use crate::core::types::OrderId;
use thiserror::Error;

/// Errors surfaced by the strategy-facing market API.
#[derive(Debug, Error)]
pub enum MarketError {
    /// The quote sequence ran out: the simulated session is over.
    #[error("scenario data exhausted at second {second}")]
    EndOfScenario { second: u64 },

    /// A buy would leave the account with negative cash.
    #[error("insufficient funds: cash {cash} cannot cover debit {debit}")]
    InsufficientFunds { cash: i64, debit: i64 },

    /// A sell exceeds the held quantity.
    #[error("insufficient holdings of {symbol}: held {held}, selling {requested}")]
    InsufficientHoldings {
        symbol: String,
        held: u64,
        requested: u64,
    },

    /// Orders for zero shares are rejected at placement.
    #[error("cannot place an order for zero shares of {symbol}")]
    ZeroQuantityOrder { symbol: String },

    /// No scenario data was loaded for the symbol.
    #[error("no scenario data for symbol {0}")]
    UnknownSymbol(String),

    /// The order id was never issued by this market.
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    /// The opposing book side is empty at the current second, so a market
    /// order has no price to execute against.
    #[error("no liquidity for {symbol} at second {second}")]
    NoLiquidity { symbol: String, second: u64 },

    /// The market has been shut down; no further orders are accepted.
    #[error("market is closed")]
    MarketClosed,

    /// The OS refused to spawn an order worker thread.
    #[error("failed to spawn order worker")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },

    /// An order worker aborted on a scheduling invariant violation.
    #[error("order worker panicked")]
    WorkerPanicked,
}

impl MarketError {
    /// Normal backtest termination, as opposed to a genuine fault.
    #[inline]
    pub fn is_end_of_scenario(&self) -> bool {
        matches!(self, MarketError::EndOfScenario { .. })
    }
}
