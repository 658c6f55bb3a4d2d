//! Order types
//!
//! Prices and cash are plain integer currency units throughout: the venues
//! this client targets quote in whole currency units, so there is no
//! fixed-point scaling anywhere in the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order.
///
/// Derived from the order's placement sequence number, so ids are dense,
/// strictly increasing in placement order, and double as the deterministic
/// tie-break for fills that land on the same simulated second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Placement sequence number (identical to the id itself).
    #[inline]
    pub const fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

impl From<u64> for OrderId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Execute immediately at the best available opposing price.
    Market,
    /// Execute only once the opposing best price crosses the given threshold.
    Limit(i64),
}

/// Order status
///
/// `Filled` and `Canceled` are terminal: an order that reaches either is
/// never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    Pending = 0,
    Filled = 1,
    Canceled = 2,
}

impl OrderStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// A request to place an order, as submitted by strategy code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub kind: OrderKind,
}

impl OrderRequest {
    /// Create a market order request.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            kind: OrderKind::Market,
        }
    }

    /// Create a limit order request.
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: u64, limit_price: i64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            kind: OrderKind::Limit(limit_price),
        }
    }
}

/// A placed order, as delivered back through the result channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub kind: OrderKind,
    pub status: OrderStatus,
    /// Price the order filled at, if it filled.
    pub fill_price: Option<i64>,
    /// Simulated second the order reached its terminal status.
    pub resolved_at: Option<u64>,
}

impl Order {
    pub fn pending(id: OrderId, request: OrderRequest) -> Self {
        Self {
            id,
            symbol: request.symbol,
            side: request.side,
            quantity: request.quantity,
            kind: request.kind,
            status: OrderStatus::Pending,
            fill_price: None,
            resolved_at: None,
        }
    }

    pub(crate) fn filled(mut self, price: i64, second: u64) -> Self {
        self.status = OrderStatus::Filled;
        self.fill_price = Some(price);
        self.resolved_at = Some(second);
        self
    }

    pub(crate) fn canceled(mut self, second: u64) -> Self {
        self.status = OrderStatus::Canceled;
        self.resolved_at = Some(second);
        self
    }
}
