//! Buy a basket at market, hold, sell it back.
//!
//! The round-trip equivalent of the simplest live trading script: sweep
//! into every symbol, sit on the position for a fixed number of seconds,
//! then sweep back out. Useful as a smoke test of venue economics and as
//! a template for anything that holds positions on a timer.

use brook_core::core::{MarketError, OrderRequest, OrderStatus, Side};
use brook_core::engine::{Session, Strategy};
use brook_core::market::Exchange;
use brook_core::sched::Runtime;
use tracing::{info, warn};

pub struct MarketSweep {
    symbols: Vec<String>,
    quantity: u64,
    hold_seconds: u64,
}

impl MarketSweep {
    pub fn new(symbols: Vec<String>, quantity: u64, hold_seconds: u64) -> Self {
        Self {
            symbols,
            quantity,
            hold_seconds,
        }
    }

    fn sweep<R: Runtime, E: Exchange>(
        &self,
        session: &Session<R, E>,
        side: Side,
    ) -> Result<(), MarketError> {
        for symbol in &self.symbols {
            let id = session.place_order(OrderRequest::market(
                symbol.clone(),
                side,
                self.quantity,
            ))?;
            let order = session.await_order_result(id)?;
            match order.status {
                OrderStatus::Filled => {
                    info!(%symbol, %side, price = ?order.fill_price, "swept");
                }
                status => {
                    warn!(%symbol, %side, ?status, "sweep order did not fill");
                }
            }
        }
        Ok(())
    }
}

impl<R: Runtime, E: Exchange> Strategy<R, E> for MarketSweep {
    fn name(&self) -> &str {
        "market-sweep"
    }

    fn run(&mut self, session: &Session<R, E>) -> Result<(), MarketError> {
        info!(deposit = session.deposit(), "sweeping in");
        self.sweep(session, Side::Buy)?;
        session.sleep(self.hold_seconds);
        self.sweep(session, Side::Sell)?;
        info!(deposit = session.deposit(), "swept out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::flat_feeder;
    use brook_core::config::SimConfig;
    use brook_core::engine::Simulator;

    #[test]
    fn sweep_holds_for_the_configured_time() {
        let feeder = flat_feeder(&[("AAA", 1000), ("BBB", 500)], 100);
        let mut strategy = MarketSweep::new(vec!["AAA".into(), "BBB".into()], 2, 10);
        let report = Simulator::new(feeder, SimConfig::default())
            .run(&mut strategy)
            .unwrap();
        assert!(report.holdings.is_empty());
        assert_eq!(report.orders_filled, 4);
        assert!(report.elapsed_seconds >= 10);
        // Sell fees: 20 bps of 2_000 (AAA) and of 1_000 (BBB).
        assert_eq!(report.final_cash, 1_000_000 - 4 - 2);
    }
}
