//! Cash and position accounting for the simulated account.
//!
//! All money amounts are integer minor currency units. Fees follow the
//! venue convention: buys debit the raw notional, sells are charged
//! `fee_bps` of the notional on the way back in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::MarketError;

/// One open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub quantity: u64,
    /// Volume-weighted acquisition price, floored to the nearest unit.
    pub average_cost: i64,
}

/// Point-in-time view of the account, safe to hand out across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub cash: i64,
    pub holdings: HashMap<String, Holding>,
}

#[derive(Debug)]
pub struct AccountLedger {
    cash: i64,
    holdings: HashMap<String, Holding>,
    fee_bps: u32,
}

impl AccountLedger {
    pub fn new(start_deposit: i64, fee_bps: u32) -> Self {
        Self {
            cash: start_deposit,
            holdings: HashMap::new(),
            fee_bps,
        }
    }

    pub fn cash(&self) -> i64 {
        self.cash
    }

    pub fn holding(&self, symbol: &str) -> Option<Holding> {
        self.holdings.get(symbol).copied()
    }

    pub fn snapshot(&self) -> Balance {
        Balance {
            cash: self.cash,
            holdings: self.holdings.clone(),
        }
    }

    fn fee(&self, notional: i64) -> i64 {
        (notional as i128 * self.fee_bps as i128 / 10_000) as i64
    }

    /// Debit cash and fold the fill into the position's weighted average
    /// cost. Rejects the fill without touching state if cash is short.
    pub fn apply_buy(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: i64,
    ) -> Result<(), MarketError> {
        let debit = price
            .checked_mul(quantity as i64)
            .unwrap_or(i64::MAX);
        if debit > self.cash {
            return Err(MarketError::InsufficientFunds {
                cash: self.cash,
                debit,
            });
        }
        self.cash -= debit;
        match self.holdings.get_mut(symbol) {
            Some(holding) => {
                let total_value = holding.quantity as i128 * holding.average_cost as i128
                    + quantity as i128 * price as i128;
                let total_quantity = holding.quantity as i128 + quantity as i128;
                holding.quantity += quantity;
                holding.average_cost = (total_value / total_quantity) as i64;
            }
            None => {
                self.holdings.insert(
                    symbol.to_string(),
                    Holding {
                        quantity,
                        average_cost: price,
                    },
                );
            }
        }
        Ok(())
    }

    /// Credit cash net of the sell-side fee and shrink the position.
    /// Rejects the fill without touching state if the position is short.
    pub fn apply_sell(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: i64,
    ) -> Result<(), MarketError> {
        let held = self.holdings.get(symbol).map_or(0, |h| h.quantity);
        if quantity > held {
            return Err(MarketError::InsufficientHoldings {
                symbol: symbol.to_string(),
                held,
                requested: quantity,
            });
        }
        let notional = price
            .checked_mul(quantity as i64)
            .unwrap_or(i64::MAX);
        self.cash += notional - self.fee(notional);
        let holding = self
            .holdings
            .get_mut(symbol)
            .ok_or_else(|| MarketError::UnknownSymbol(symbol.to_string()))?;
        holding.quantity -= quantity;
        if holding.quantity == 0 {
            self.holdings.remove(symbol);
        }
        Ok(())
    }
}
