//! Brook Core - Deterministic Virtual-Time Backtester
//!
//! Brook replays recorded or synthetic market data through real trading
//! code under a simulated clock. The clock advances by exactly one second
//! only when every live task has genuinely stalled (asleep or waiting on
//! data), so a multi-threaded strategy backtests deterministically and as
//! fast as the host can run it, never at wall-clock speed.
//!
//! ## Architecture
//! - **Quiescence-driven clock**: one second per system-wide stall, no
//!   wall-clock delays anywhere
//! - **One worker task per order**: the fulfillment state machine runs
//!   concurrently, exactly as it would against a live venue
//! - **Runtime and Exchange seams**: strategies are generic over both, so
//!   the same code backtests and trades live
//!
//! ## Core Modules
//! - `core`: order types and the error taxonomy
//! - `sched`: simulated clock, quiescence tracking, virtual sleep,
//!   blocking-aware tasks and channels
//! - `data`: scenario loading and synthetic quote generation
//! - `market`: order fulfillment engine and account ledger
//! - `engine`: the backtest harness strategies run inside
//! - `config`: run parameters and venue constants

pub mod config;
pub mod core;
pub mod data;
pub mod engine;
pub mod market;
pub mod sched;
pub mod utils;

pub use crate::core::{MarketError, Order, OrderId, OrderKind, OrderRequest, OrderStatus, Side};

pub use data::{QuoteSnapshot, ScenarioFeeder};
pub use engine::{RunReport, Session, Simulator, Strategy};
pub use market::{Balance, Exchange, Holding, SimMarket};
pub use sched::{RealtimeRuntime, Runtime, SimScheduler, TaskToken};

pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::SimConfig;
    pub use crate::core::{MarketError, Order, OrderId, OrderKind, OrderRequest, OrderStatus, Side};
    pub use crate::data::{synthetic, QuoteSnapshot, ScenarioFeeder};
    pub use crate::engine::{RunReport, Session, Simulator, Strategy};
    pub use crate::market::{Balance, Exchange, Holding, SimMarket};
    pub use crate::sched::{Runtime, SimScheduler, TaskToken};
    pub use crate::{Error, Result};
}
