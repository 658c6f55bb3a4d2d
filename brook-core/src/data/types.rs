//! Quote snapshot types
//!
//! One snapshot is the ten-level bid/ask book for one symbol at one
//! simulated second. Snapshots are immutable once loaded; asks are stored
//! best-first ascending, bids best-first descending.

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price: i64,
    pub size: u64,
}

/// The bid/ask book for one symbol at one simulated second.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteSnapshot {
    asks: Vec<BookLevel>,
    bids: Vec<BookLevel>,
}

impl QuoteSnapshot {
    /// `asks` best-first ascending, `bids` best-first descending.
    pub fn new(asks: Vec<BookLevel>, bids: Vec<BookLevel>) -> Self {
        Self { asks, bids }
    }

    #[inline]
    pub fn asks(&self) -> &[BookLevel] {
        &self.asks
    }

    #[inline]
    pub fn bids(&self) -> &[BookLevel] {
        &self.bids
    }

    /// Best (lowest) ask, if that side has any depth.
    #[inline]
    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    /// Best (highest) bid, if that side has any depth.
    #[inline]
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }

    /// Midpoint of the best bid and ask.
    pub fn mid(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2),
            _ => None,
        }
    }
}
