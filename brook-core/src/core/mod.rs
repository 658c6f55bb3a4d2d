//! Core order and account types shared by the simulated and live backends.

pub mod errors;
pub mod types;

pub use errors::MarketError;
pub use types::{Order, OrderId, OrderKind, OrderRequest, OrderStatus, Side};
