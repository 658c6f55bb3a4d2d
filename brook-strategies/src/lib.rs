//! Brook Strategies - Reference Trading Strategies
//!
//! Strategy implementations for the brook backtest engine. Every strategy
//! is generic over the runtime and exchange, so the same code runs under
//! the simulated clock and against a live venue adapter.
//!
//! ## Available Strategies
//!
//! ### [`MarketSweep`] - Timed Round Trip
//!
//! Sweeps into a basket of symbols at market, holds for a configured
//! number of seconds, then sweeps back out. The simplest full exercise of
//! placement, fulfillment, and the account ledger.
//!
//! ### [`BuyAndCancel`] - Resting Bid Lifecycle
//!
//! Rests limit bids below the market, waits, then cancels them all.
//! Exercises the cancel path and confirms canceled orders leave the
//! account untouched.
//!
//! ## Integration with brook-core
//!
//! Strategies implement the `brook_core::engine::Strategy` trait:
//!
//! ```rust,ignore
//! pub trait Strategy<R: Runtime, E: Exchange> {
//!     fn name(&self) -> &str;
//!     fn run(&mut self, session: &Session<R, E>) -> Result<(), MarketError>;
//! }
//! ```
//!
//! and are driven by `Simulator::run`, which owns the scheduler, the
//! simulated market, and the root task for the strategy thread.

pub mod buy_and_cancel;
pub mod market_sweep;

mod test_helpers;

pub use buy_and_cancel::BuyAndCancel;
pub use market_sweep::MarketSweep;
