//! Test helpers for building scenario feeders
//!
//! These utilities make it easy to test strategy logic against small
//! deterministic scenarios without touching recorded data files.

#[cfg(test)]
use brook_core::data::{synthetic, ScenarioFeeder};

/// Build a feeder with one flat-priced book per symbol.
#[cfg(test)]
pub fn flat_feeder(symbols: &[(&str, i64)], seconds: usize) -> ScenarioFeeder {
    let mut feeder = ScenarioFeeder::new();
    for &(symbol, price) in symbols {
        feeder.insert(symbol, synthetic::flat(price, seconds));
    }
    feeder
}
