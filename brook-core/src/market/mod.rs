//! Order fulfillment and account state
//!
//! This module provides the market side of a session:
//! - `Exchange`: the trait strategies trade through
//! - `SimMarket`: scenario-driven implementation with one fulfillment
//!   worker per order
//! - `AccountLedger`: integer cash and position accounting

pub mod ledger;
pub mod sim;

#[cfg(test)]
mod ledger_proptest;

pub use ledger::{AccountLedger, Balance, Holding};
pub use sim::SimMarket;

use crate::core::{MarketError, Order, OrderId, OrderRequest};
use crate::data::QuoteSnapshot;
use crate::sched::TaskToken;

/// Capability surface a strategy trades through. Implemented by the
/// scenario-driven market and, for live trading, a venue adapter.
pub trait Exchange: Send + Sync + 'static {
    /// Submit an order for asynchronous fulfillment. Returns immediately
    /// with the order's id.
    fn place_order(&self, request: OrderRequest) -> Result<OrderId, MarketError>;

    /// Block until the order reaches a terminal state and take its
    /// result. Each order's result can be taken at most once; a second
    /// await for the same order never returns.
    fn await_order_result(&self, token: TaskToken, id: OrderId) -> Result<Order, MarketError>;

    /// Ask the fulfillment worker to cancel a pending order. Returns as
    /// soon as the request is recorded; the terminal state still arrives
    /// through `await_order_result`.
    fn cancel_order(&self, id: OrderId) -> Result<(), MarketError>;

    /// Current order book for a symbol.
    fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketError>;

    /// Current cash and positions.
    fn balance(&self) -> Balance;

    /// Current cash only.
    fn deposit(&self) -> i64;
}
