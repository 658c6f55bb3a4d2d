//! Strategy-facing session handle.
//!
//! A `Session` bundles the runtime a task schedules against with the
//! exchange it trades through, plus the task's own scheduling token.
//! Strategies are written against this handle and stay generic over
//! whether time is simulated or real.

use std::io;
use std::time::SystemTime;

use std::sync::Arc;

use crate::core::{MarketError, Order, OrderId, OrderRequest};
use crate::data::QuoteSnapshot;
use crate::market::{Balance, Exchange};
use crate::sched::{spawn_task, Runtime, TaskHandle, TaskToken};

pub struct Session<R: Runtime, E: Exchange> {
    runtime: Arc<R>,
    exchange: Arc<E>,
    token: TaskToken,
}

impl<R: Runtime, E: Exchange> Session<R, E> {
    pub fn new(runtime: Arc<R>, exchange: Arc<E>, token: TaskToken) -> Self {
        Self {
            runtime,
            exchange,
            token,
        }
    }

    pub fn token(&self) -> TaskToken {
        self.token
    }

    /// Block this task for `seconds` of (virtual or real) time.
    pub fn sleep(&self, seconds: u64) {
        self.runtime.sleep(self.token, seconds);
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.runtime.elapsed_seconds()
    }

    pub fn now(&self) -> SystemTime {
        self.runtime.now()
    }

    pub fn place_order(&self, request: OrderRequest) -> Result<OrderId, MarketError> {
        self.exchange.place_order(request)
    }

    /// Block until the order resolves and take its terminal state.
    pub fn await_order_result(&self, id: OrderId) -> Result<Order, MarketError> {
        self.exchange.await_order_result(self.token, id)
    }

    pub fn cancel_order(&self, id: OrderId) -> Result<(), MarketError> {
        self.exchange.cancel_order(id)
    }

    pub fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketError> {
        self.exchange.quote(symbol)
    }

    pub fn balance(&self) -> Balance {
        self.exchange.balance()
    }

    pub fn deposit(&self) -> i64 {
        self.exchange.deposit()
    }

    /// Spawn a child task with its own session. The child is registered
    /// with the runtime before it starts running.
    pub fn spawn<F, T>(&self, name: &str, f: F) -> io::Result<TaskHandle<T>>
    where
        F: FnOnce(Session<R, E>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let runtime = Arc::clone(&self.runtime);
        let exchange = Arc::clone(&self.exchange);
        spawn_task(&self.runtime, name, move |token| {
            f(Session::new(runtime, exchange, token))
        })
    }

    /// Join a child task, counting this task as blocked while it waits.
    pub fn join<T>(&self, handle: TaskHandle<T>) -> std::thread::Result<T> {
        handle.join(&*self.runtime, self.token)
    }
}

/// Trading logic run by the engine. Implementations stay generic over the
/// runtime and exchange so the same strategy backtests and trades live.
pub trait Strategy<R: Runtime, E: Exchange> {
    fn name(&self) -> &str;

    fn run(&mut self, session: &Session<R, E>) -> Result<(), MarketError>;
}
