//! Place resting bids below the market, then pull them.
//!
//! Exercises the cancel path end to end: limit orders rest without
//! filling, the strategy waits, then cancels everything and confirms
//! each order resolved as canceled with the account untouched.

use brook_core::core::{MarketError, OrderRequest, OrderStatus, Side};
use brook_core::engine::{Session, Strategy};
use brook_core::market::Exchange;
use brook_core::sched::Runtime;
use tracing::{info, warn};

pub struct BuyAndCancel {
    symbols: Vec<String>,
    quantity: u64,
    /// How far below the best bid to rest, in price units.
    discount: i64,
    rest_seconds: u64,
}

impl BuyAndCancel {
    pub fn new(symbols: Vec<String>, quantity: u64, discount: i64, rest_seconds: u64) -> Self {
        Self {
            symbols,
            quantity,
            discount,
            rest_seconds,
        }
    }
}

impl<R: Runtime, E: Exchange> Strategy<R, E> for BuyAndCancel {
    fn name(&self) -> &str {
        "buy-and-cancel"
    }

    fn run(&mut self, session: &Session<R, E>) -> Result<(), MarketError> {
        let mut resting = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            let quote = session.quote(symbol)?;
            let Some(bid) = quote.best_bid() else {
                warn!(%symbol, "no bid to price against, skipping");
                continue;
            };
            let limit = bid.price - self.discount;
            let id = session.place_order(OrderRequest::limit(
                symbol.clone(),
                Side::Buy,
                self.quantity,
                limit,
            ))?;
            info!(%symbol, limit, "resting bid placed");
            resting.push(id);
        }

        session.sleep(self.rest_seconds);

        for id in resting {
            session.cancel_order(id)?;
            let order = session.await_order_result(id)?;
            match order.status {
                OrderStatus::Canceled => info!(%id, "bid pulled"),
                OrderStatus::Filled => {
                    warn!(%id, price = ?order.fill_price, "bid filled before the pull")
                }
                OrderStatus::Pending => unreachable!("awaited orders are terminal"),
            }
        }
        Ok(())
    }
}
