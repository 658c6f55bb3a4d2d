//! Backtest harness.
//!
//! `Simulator` wires a scheduler, a simulated market, and a strategy
//! together, runs the strategy to completion on the root task, and
//! reports the final account state. End-of-scenario is the normal way a
//! backtest ends and is folded into a successful report.

pub mod session;

pub use session::{Session, Strategy};

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::SimConfig;
use crate::core::MarketError;
use crate::data::ScenarioFeeder;
use crate::market::{Exchange, Holding, SimMarket};
use crate::sched::{spawn_task, SimScheduler};

/// Final state of a completed backtest.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: String,
    pub elapsed_seconds: u64,
    pub final_cash: i64,
    pub holdings: HashMap<String, Holding>,
    pub orders_placed: u64,
    pub orders_filled: u64,
    pub orders_canceled: u64,
}

pub struct Simulator {
    feeder: ScenarioFeeder,
    config: SimConfig,
}

impl Simulator {
    pub fn new(feeder: ScenarioFeeder, config: SimConfig) -> Self {
        Self { feeder, config }
    }

    /// Run `strategy` against the scenario until it returns or the
    /// scenario ends, then cancel anything still pending and report.
    pub fn run<S>(self, strategy: &mut S) -> Result<RunReport>
    where
        S: Strategy<SimScheduler, SimMarket>,
    {
        let sched = Arc::new(SimScheduler::new());
        let market = SimMarket::new(Arc::clone(&sched), self.feeder, &self.config);
        // The strategy runs on the scheduler's root task, so the clock
        // cannot tick while it is between sleeps, placing orders.
        let token = sched.root_token();
        let session = Session::new(Arc::clone(&sched), Arc::new(market.clone()), token);

        // Optional run-length cap: a task that closes the market after
        // `max_seconds` ticks. Pending orders then cancel out and the
        // strategy's next placement is refused.
        let watchdog = match self.config.max_seconds {
            Some(max) => {
                let market = market.clone();
                let watchdog_sched = Arc::clone(&sched);
                let handle = spawn_task(&sched, "watchdog", move |token| {
                    for _ in 0..max {
                        if market.is_closed() {
                            return;
                        }
                        watchdog_sched.sleep(token, 1);
                    }
                    market.shutdown();
                })
                .context("failed to spawn watchdog task")?;
                Some(handle)
            }
            None => None,
        };

        info!(strategy = strategy.name(), "backtest starting");
        let outcome = strategy.run(&session);

        market.shutdown();
        market
            .join_workers(token)
            .context("fulfillment worker failed")?;
        if let Some(handle) = watchdog {
            handle
                .join(&*sched, token)
                .map_err(|_| anyhow::anyhow!("watchdog task panicked"))?;
        }

        match outcome {
            Ok(()) => {}
            Err(err) if run_ended_normally(&err) => {
                info!(%err, "backtest ended");
            }
            Err(err) => return Err(err).context("strategy failed"),
        }

        let balance = market.balance();
        let report = RunReport {
            strategy: strategy.name().to_string(),
            elapsed_seconds: sched.elapsed_seconds(),
            final_cash: balance.cash,
            holdings: balance.holdings,
            orders_placed: market.orders_placed(),
            orders_filled: market.orders_filled(),
            orders_canceled: market.orders_canceled(),
        };
        info!(
            elapsed_seconds = report.elapsed_seconds,
            final_cash = report.final_cash,
            "backtest complete"
        );
        Ok(report)
    }
}

/// End-of-scenario is the scenario running out of data; a closed market
/// is the harness capping the run. Both end a backtest without fault.
fn run_ended_normally(err: &MarketError) -> bool {
    err.is_end_of_scenario() || matches!(err, MarketError::MarketClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OrderRequest, OrderStatus, Side};
    use crate::data::synthetic;

    struct SweepOnce;

    impl Strategy<SimScheduler, SimMarket> for SweepOnce {
        fn name(&self) -> &str {
            "sweep-once"
        }

        fn run(
            &mut self,
            session: &Session<SimScheduler, SimMarket>,
        ) -> Result<(), MarketError> {
            let id = session.place_order(OrderRequest::market("AAA", Side::Buy, 10))?;
            let order = session.await_order_result(id)?;
            assert_eq!(order.status, OrderStatus::Filled);
            session.sleep(1);
            let id = session.place_order(OrderRequest::market("AAA", Side::Sell, 10))?;
            session.await_order_result(id)?;
            Ok(())
        }
    }

    fn flat_feeder(seconds: u64) -> ScenarioFeeder {
        let mut feeder = ScenarioFeeder::new();
        feeder.insert("AAA", synthetic::flat(1000, seconds as usize));
        feeder
    }

    #[test]
    fn sweep_round_trip_report() {
        let mut strategy = SweepOnce;
        let report = Simulator::new(flat_feeder(100), SimConfig::default())
            .run(&mut strategy)
            .unwrap();
        assert_eq!(report.final_cash, 999_980);
        assert!(report.holdings.is_empty());
        assert_eq!(report.orders_placed, 2);
        assert_eq!(report.orders_filled, 2);
    }

    struct ReadUntilScenarioEnd;

    impl Strategy<SimScheduler, SimMarket> for ReadUntilScenarioEnd {
        fn name(&self) -> &str {
            "read-until-end"
        }

        fn run(
            &mut self,
            session: &Session<SimScheduler, SimMarket>,
        ) -> Result<(), MarketError> {
            loop {
                session.quote("AAA")?;
                session.sleep(1);
            }
        }
    }

    #[test]
    fn scenario_exhaustion_ends_the_run_cleanly() {
        let mut strategy = ReadUntilScenarioEnd;
        let report = Simulator::new(flat_feeder(20), SimConfig::default())
            .run(&mut strategy)
            .unwrap();
        assert_eq!(report.elapsed_seconds, 20);
        assert_eq!(report.final_cash, 1_000_000);
    }

    struct BuyForever;

    impl Strategy<SimScheduler, SimMarket> for BuyForever {
        fn name(&self) -> &str {
            "buy-forever"
        }

        fn run(
            &mut self,
            session: &Session<SimScheduler, SimMarket>,
        ) -> Result<(), MarketError> {
            loop {
                let id = session.place_order(OrderRequest::market("AAA", Side::Buy, 1))?;
                session.await_order_result(id)?;
                session.sleep(1);
            }
        }
    }

    #[test]
    fn max_seconds_caps_the_run() {
        let config = SimConfig {
            max_seconds: Some(5),
            ..SimConfig::default()
        };
        let mut strategy = BuyForever;
        let report = Simulator::new(flat_feeder(1_000), config)
            .run(&mut strategy)
            .unwrap();
        assert!(report.elapsed_seconds >= 5);
        assert!(report.elapsed_seconds <= 7);
        assert!(report.orders_filled >= 4);
    }

    struct Overspender;

    impl Strategy<SimScheduler, SimMarket> for Overspender {
        fn name(&self) -> &str {
            "overspender"
        }

        fn run(
            &mut self,
            session: &Session<SimScheduler, SimMarket>,
        ) -> Result<(), MarketError> {
            let id = session.place_order(OrderRequest::market("AAA", Side::Buy, 5_000))?;
            session.await_order_result(id)?;
            Ok(())
        }
    }

    #[test]
    fn ledger_rejection_is_a_fatal_run_error() {
        let mut strategy = Overspender;
        let err = Simulator::new(flat_feeder(10), SimConfig::default())
            .run(&mut strategy)
            .unwrap_err();
        assert!(format!("{err:#}").contains("insufficient"));
    }
}
