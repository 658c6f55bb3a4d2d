//! Scenario-driven market with one fulfillment worker per order.
//!
//! Placement spawns a worker task that re-evaluates the order once per
//! simulated second until it fills, is canceled, or the scenario ends.
//! Workers spend the rest of each second blocked in a virtual sleep, so
//! the scheduler sees them as stalled and the clock keeps moving.
//!
//! Fills are serialized through a turnstile: within one simulated second,
//! every pending order evaluates in placement order, so two orders racing
//! for the same cash or holdings always resolve the same way run to run.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info};

use crate::config::SimConfig;
use crate::core::{MarketError, Order, OrderId, OrderKind, OrderRequest, Side};
use crate::data::{QuoteSnapshot, ScenarioFeeder};
use crate::market::ledger::{AccountLedger, Balance};
use crate::market::Exchange;
use crate::sched::{sim_channel, spawn_task, SimReceiver, SimScheduler, SimSender, TaskHandle, TaskToken};

type OrderResult = Result<Order, MarketError>;

/// Serializes per-second order evaluations by placement sequence.
///
/// Every pending worker evaluates exactly once per simulated second. A
/// worker may not begin its evaluation until every pending order with a
/// lower sequence has finished its own evaluation for that second. The
/// wait is not reported to the scheduler as blocked: whenever a worker
/// waits here, the worker it waits on is awake and evaluating, so the
/// clock must not advance anyway.
struct FillTurnstile {
    state: Mutex<TurnState>,
    cv: Condvar,
}

struct TurnState {
    /// Sequences of live (unresolved) orders.
    pending: BTreeSet<u64>,
    /// Sequences that have completed their evaluation for `second`.
    evaluated: BTreeSet<u64>,
    second: u64,
}

impl FillTurnstile {
    fn new() -> Self {
        Self {
            state: Mutex::new(TurnState {
                pending: BTreeSet::new(),
                evaluated: BTreeSet::new(),
                second: 0,
            }),
            cv: Condvar::new(),
        }
    }

    /// Register a newly placed order. Must happen before its worker can
    /// evaluate, and before any later placement.
    fn admit(&self, seq: u64) {
        self.state.lock().pending.insert(seq);
    }

    /// Remove an order that never got a worker.
    fn retire(&self, seq: u64) {
        self.state.lock().pending.remove(&seq);
        self.cv.notify_all();
    }

    fn begin_eval(&self, seq: u64, second: u64) {
        let mut state = self.state.lock();
        if state.second != second {
            state.second = second;
            state.evaluated.clear();
        }
        loop {
            let turn = state
                .pending
                .range(..seq)
                .all(|lower| state.evaluated.contains(lower));
            if turn {
                return;
            }
            self.cv.wait(&mut state);
        }
    }

    fn end_eval(&self, seq: u64, resolved: bool) {
        let mut state = self.state.lock();
        state.evaluated.insert(seq);
        if resolved {
            state.pending.remove(&seq);
        }
        self.cv.notify_all();
    }
}

struct OrderSlot {
    cancel: Arc<AtomicBool>,
    /// Kept alive so the result channel never disconnects; a second await
    /// for an already-consumed result blocks forever rather than erroring.
    tx: SimSender<OrderResult>,
    rx: SimReceiver<OrderResult>,
}

struct Inner {
    sched: Arc<SimScheduler>,
    feeder: ScenarioFeeder,
    ledger: Mutex<AccountLedger>,
    orders: DashMap<OrderId, OrderSlot>,
    workers: Mutex<Vec<TaskHandle<()>>>,
    turnstile: FillTurnstile,
    next_seq: AtomicU64,
    closed: AtomicBool,
    placed: AtomicU64,
    filled: AtomicU64,
    canceled: AtomicU64,
}

/// Simulated exchange. Cheap to clone; all clones share one account and
/// one order registry.
#[derive(Clone)]
pub struct SimMarket {
    inner: Arc<Inner>,
}

impl SimMarket {
    pub fn new(sched: Arc<SimScheduler>, feeder: ScenarioFeeder, config: &SimConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                sched,
                feeder,
                ledger: Mutex::new(AccountLedger::new(config.start_deposit, config.fee_bps)),
                orders: DashMap::new(),
                workers: Mutex::new(Vec::new()),
                turnstile: FillTurnstile::new(),
                next_seq: AtomicU64::new(1),
                closed: AtomicBool::new(false),
                placed: AtomicU64::new(0),
                filled: AtomicU64::new(0),
                canceled: AtomicU64::new(0),
            }),
        }
    }

    /// Stop accepting orders and ask every pending worker to cancel out.
    /// Workers observe the flag at their next per-second evaluation.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        info!("market closed, pending orders will cancel");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Join every fulfillment worker. The joiner counts as blocked while
    /// it waits, so workers still receive the ticks they need to finish.
    pub fn join_workers(&self, token: TaskToken) -> Result<(), MarketError> {
        let handles = std::mem::take(&mut *self.inner.workers.lock());
        for handle in handles {
            handle
                .join(&*self.inner.sched, token)
                .map_err(|_| MarketError::WorkerPanicked)?;
        }
        Ok(())
    }

    pub fn orders_placed(&self) -> u64 {
        self.inner.placed.load(Ordering::Relaxed)
    }

    pub fn orders_filled(&self) -> u64 {
        self.inner.filled.load(Ordering::Relaxed)
    }

    pub fn orders_canceled(&self) -> u64 {
        self.inner.canceled.load(Ordering::Relaxed)
    }
}

impl Exchange for SimMarket {
    fn place_order(&self, request: OrderRequest) -> Result<OrderId, MarketError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(MarketError::MarketClosed);
        }
        if request.quantity == 0 {
            return Err(MarketError::ZeroQuantityOrder {
                symbol: request.symbol.clone(),
            });
        }
        if !inner.feeder.contains(&request.symbol) {
            return Err(MarketError::UnknownSymbol(request.symbol.clone()));
        }

        let seq = inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = OrderId(seq);
        inner.turnstile.admit(seq);

        let (tx, rx) = sim_channel(&inner.sched, 1);
        let cancel = Arc::new(AtomicBool::new(false));
        let order = Order::pending(id, request);
        inner.orders.insert(
            id,
            OrderSlot {
                cancel: Arc::clone(&cancel),
                tx: tx.clone(),
                rx,
            },
        );

        let worker_inner = Arc::clone(inner);
        let spawned = spawn_task(&inner.sched, &format!("order-{id}"), move |token| {
            drive_order(&worker_inner, token, order, cancel, tx);
        });
        match spawned {
            Ok(handle) => {
                inner.workers.lock().push(handle);
                inner.placed.fetch_add(1, Ordering::Relaxed);
                debug!(%id, "order placed");
                Ok(id)
            }
            Err(source) => {
                inner.orders.remove(&id);
                inner.turnstile.retire(seq);
                Err(MarketError::WorkerSpawn { source })
            }
        }
    }

    fn await_order_result(&self, token: TaskToken, id: OrderId) -> Result<Order, MarketError> {
        let rx = {
            let slot = self
                .inner
                .orders
                .get(&id)
                .ok_or(MarketError::UnknownOrder(id))?;
            slot.rx.clone()
            // Guard dropped here; holding it across the blocking recv
            // would stall every other registry access.
        };
        match rx.recv(token) {
            Ok(result) => result,
            Err(_) => Err(MarketError::WorkerPanicked),
        }
    }

    fn cancel_order(&self, id: OrderId) -> Result<(), MarketError> {
        let slot = self
            .inner
            .orders
            .get(&id)
            .ok_or(MarketError::UnknownOrder(id))?;
        slot.cancel.store(true, Ordering::Release);
        debug!(%id, "cancel requested");
        Ok(())
    }

    fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketError> {
        if !self.inner.feeder.contains(symbol) {
            return Err(MarketError::UnknownSymbol(symbol.to_string()));
        }
        let second = self.inner.sched.elapsed_seconds();
        self.inner
            .feeder
            .snapshot(symbol, second)
            .cloned()
            .ok_or(MarketError::EndOfScenario { second })
    }

    fn balance(&self) -> Balance {
        self.inner.ledger.lock().snapshot()
    }

    fn deposit(&self) -> i64 {
        self.inner.ledger.lock().cash()
    }
}

/// Worker loop for one order. Runs until the order resolves, then
/// publishes the terminal result exactly once.
fn drive_order(
    inner: &Arc<Inner>,
    token: TaskToken,
    order: Order,
    cancel: Arc<AtomicBool>,
    tx: SimSender<OrderResult>,
) {
    let seq = order.id.sequence();
    loop {
        let second = inner.sched.elapsed_seconds();
        inner.turnstile.begin_eval(seq, second);
        let resolution = evaluate(inner, &order, &cancel, second);
        inner.turnstile.end_eval(seq, resolution.is_some());
        match resolution {
            Some(result) => {
                if tx.try_send(result).is_err() {
                    // Capacity is 1 and only this worker publishes.
                    error!(id = %order.id, "order result channel rejected publication");
                }
                return;
            }
            None => inner.sched.sleep(token, 1),
        }
    }
}

/// One per-second evaluation. `None` keeps the order pending.
fn evaluate(
    inner: &Inner,
    order: &Order,
    cancel: &AtomicBool,
    second: u64,
) -> Option<OrderResult> {
    if inner.closed.load(Ordering::Acquire) || cancel.load(Ordering::Acquire) {
        inner.canceled.fetch_add(1, Ordering::Relaxed);
        debug!(id = %order.id, second, "order canceled");
        return Some(Ok(order.clone().canceled(second)));
    }

    let snapshot = match inner.feeder.snapshot(&order.symbol, second) {
        Some(snapshot) => snapshot,
        None => return Some(Err(MarketError::EndOfScenario { second })),
    };

    // A buy takes liquidity from the asks, a sell from the bids.
    let best = match order.side {
        Side::Buy => snapshot.best_ask(),
        Side::Sell => snapshot.best_bid(),
    };
    let Some(best) = best else {
        return Some(Err(MarketError::NoLiquidity {
            symbol: order.symbol.clone(),
            second,
        }));
    };

    if let OrderKind::Limit(limit) = order.kind {
        let crosses = match order.side {
            Side::Buy => best.price <= limit,
            Side::Sell => best.price >= limit,
        };
        if !crosses {
            return None;
        }
    }

    let applied = {
        let mut ledger = inner.ledger.lock();
        match order.side {
            Side::Buy => ledger.apply_buy(&order.symbol, order.quantity, best.price),
            Side::Sell => ledger.apply_sell(&order.symbol, order.quantity, best.price),
        }
    };
    match applied {
        Ok(()) => {
            inner.filled.fetch_add(1, Ordering::Relaxed);
            debug!(id = %order.id, second, price = best.price, "order filled");
            Some(Ok(order.clone().filled(best.price, second)))
        }
        Err(err) => {
            error!(id = %order.id, second, %err, "order rejected");
            Some(Err(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OrderStatus;
    use crate::data::synthetic;

    fn flat_market(sched: &Arc<SimScheduler>, seconds: usize) -> SimMarket {
        let mut feeder = ScenarioFeeder::new();
        feeder.insert("AAA", synthetic::flat(1000, seconds));
        SimMarket::new(Arc::clone(sched), feeder, &SimConfig::default())
    }

    #[test]
    fn market_buy_fills_at_best_ask() {
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 10);
        let token = sched.root_token();

        let id = market
            .place_order(OrderRequest::market("AAA", Side::Buy, 10))
            .unwrap();
        let order = market.await_order_result(token, id).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.fill_price, Some(1000));
        assert_eq!(market.deposit(), 990_000);
        assert_eq!(market.orders_filled(), 1);
    }

    #[test]
    fn round_trip_pays_the_sell_fee() {
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 10);
        let token = sched.root_token();

        let id = market
            .place_order(OrderRequest::market("AAA", Side::Buy, 10))
            .unwrap();
        market.await_order_result(token, id).unwrap();
        let id = market
            .place_order(OrderRequest::market("AAA", Side::Sell, 10))
            .unwrap();
        let order = market.await_order_result(token, id).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        // Flat book quotes both sides at the same price, so the round
        // trip only loses the 20 bps sell fee.
        assert_eq!(order.fill_price, Some(1000));
        assert_eq!(market.deposit(), 999_980);
        assert!(market.balance().holdings.is_empty());
    }

    #[test]
    fn limit_buy_waits_for_the_cross() {
        let sched = Arc::new(SimScheduler::new());
        let mut feeder = ScenarioFeeder::new();
        // Ask starts at 1010 and steps down to 1000 at second 5.
        let mut series = synthetic::flat(1010, 5);
        series.extend(synthetic::flat(1000, 10));
        feeder.insert("AAA", series);
        let market = SimMarket::new(Arc::clone(&sched), feeder, &SimConfig::default());
        let token = sched.root_token();

        let id = market
            .place_order(OrderRequest::limit("AAA", Side::Buy, 1, 1000))
            .unwrap();
        let order = market.await_order_result(token, id).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.fill_price, Some(1000));
        assert_eq!(order.resolved_at, Some(5));
        assert_eq!(sched.elapsed_seconds(), 5);
    }

    #[test]
    fn cancel_resolves_within_one_second() {
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 100);
        let token = sched.root_token();

        // A limit far from the market never crosses on a flat book.
        let id = market
            .place_order(OrderRequest::limit("AAA", Side::Buy, 1, 1))
            .unwrap();
        market.cancel_order(id).unwrap();
        let placed_at = sched.elapsed_seconds();
        let order = market.await_order_result(token, id).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert!(sched.elapsed_seconds() <= placed_at + 1);
        assert_eq!(market.orders_canceled(), 1);
    }

    #[test]
    fn scenario_end_surfaces_to_the_awaiter() {
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 3);
        let token = sched.root_token();

        let id = market
            .place_order(OrderRequest::limit("AAA", Side::Buy, 1, 1))
            .unwrap();
        let err = market.await_order_result(token, id).unwrap_err();
        assert!(err.is_end_of_scenario());
    }

    #[test]
    fn placement_validation() {
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 10);

        assert!(matches!(
            market.place_order(OrderRequest::market("AAA", Side::Buy, 0)),
            Err(MarketError::ZeroQuantityOrder { .. })
        ));
        assert!(matches!(
            market.place_order(OrderRequest::market("ZZZ", Side::Buy, 1)),
            Err(MarketError::UnknownSymbol(_))
        ));
        market.shutdown();
        assert!(matches!(
            market.place_order(OrderRequest::market("AAA", Side::Buy, 1)),
            Err(MarketError::MarketClosed)
        ));
    }

    #[test]
    fn same_second_rejections_resolve_in_placement_order() {
        // Two sells race for the same 10 shares. The first-placed order
        // must win every run; the second sees an empty position.
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 10);
        let token = sched.root_token();

        let buy = market
            .place_order(OrderRequest::market("AAA", Side::Buy, 10))
            .unwrap();
        market.await_order_result(token, buy).unwrap();

        let first = market
            .place_order(OrderRequest::market("AAA", Side::Sell, 10))
            .unwrap();
        let second = market
            .place_order(OrderRequest::market("AAA", Side::Sell, 10))
            .unwrap();
        let first = market.await_order_result(token, first).unwrap();
        assert_eq!(first.status, OrderStatus::Filled);
        let err = market.await_order_result(token, second).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientHoldings { .. }));
    }

    #[test]
    fn unknown_order_ids_are_rejected() {
        let sched = Arc::new(SimScheduler::new());
        let market = flat_market(&sched, 10);
        let token = sched.root_token();

        assert!(matches!(
            market.cancel_order(OrderId(99)),
            Err(MarketError::UnknownOrder(_))
        ));
        assert!(matches!(
            market.await_order_result(token, OrderId(99)),
            Err(MarketError::UnknownOrder(_))
        ));
    }
}
