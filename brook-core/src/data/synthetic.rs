//! Synthetic quote generation
//!
//! Builds scenario data without recorded files: each second's midpoint
//! derives from the previous one via a small bounded random walk (at most
//! three ticks per step), and the book widens outward from the midpoint by
//! one tick per level on each side. Used by tests and the synthetic backtest
//! binary.

use rand::Rng;

use crate::config::constants::{BOOK_DEPTH, PRICE_TICK};
use crate::data::types::{BookLevel, QuoteSnapshot};

/// Largest per-second midpoint move, in ticks.
const MAX_WALK_TICKS: i64 = 3;

/// Size attached to every flat-book level.
const FLAT_LEVEL_SIZE: u64 = 1_000;

/// Book at a single price: best ask and best bid both sit exactly at
/// `price`, deeper levels widen one tick per level. Both market buys and
/// market sells execute at `price`, which makes round-trip accounting exact.
pub fn flat(price: i64, seconds: usize) -> Vec<QuoteSnapshot> {
    (0..seconds)
        .map(|_| book_around(price, price, &mut |_| FLAT_LEVEL_SIZE))
        .collect()
}

/// Random-walk book: starts at `initial_price`, moves the midpoint by a
/// bounded number of ticks per second, with random sizes per level.
pub fn random_walk(initial_price: i64, seconds: usize, rng: &mut impl Rng) -> Vec<QuoteSnapshot> {
    let mut price = initial_price.max(PRICE_TICK);
    let mut series = Vec::with_capacity(seconds);
    for _ in 0..seconds {
        let snap = book_around(price, price - PRICE_TICK, &mut |_| rng.gen_range(0..=1_000));
        series.push(snap);
        let step = rng.gen_range(-MAX_WALK_TICKS..=MAX_WALK_TICKS);
        price = (price + step * PRICE_TICK).max(PRICE_TICK);
    }
    series
}

/// Build one snapshot with asks widening up from `best_ask` and bids
/// widening down from `best_bid`, one tick per level.
fn book_around(
    best_ask: i64,
    best_bid: i64,
    size_of: &mut impl FnMut(usize) -> u64,
) -> QuoteSnapshot {
    let asks = (0..BOOK_DEPTH)
        .map(|level| BookLevel {
            price: best_ask + level as i64 * PRICE_TICK,
            size: size_of(level),
        })
        .collect();
    let bids = (0..BOOK_DEPTH)
        .map(|level| BookLevel {
            price: best_bid - level as i64 * PRICE_TICK,
            size: size_of(level),
        })
        .collect();
    QuoteSnapshot::new(asks, bids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn flat_book_is_tickless_at_the_given_price() {
        let series = flat(1000, 5);
        assert_eq!(series.len(), 5);
        for snap in &series {
            assert_eq!(snap.best_ask().unwrap().price, 1000);
            assert_eq!(snap.best_bid().unwrap().price, 1000);
            assert_eq!(snap.asks().len(), BOOK_DEPTH);
            assert_eq!(snap.bids().len(), BOOK_DEPTH);
        }
    }

    #[test]
    fn walk_is_bounded_and_widens_one_tick_per_level() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = random_walk(1000, 200, &mut rng);
        assert_eq!(series.len(), 200);

        let mut prev_mid = None;
        for snap in &series {
            assert_eq!(snap.asks().len(), BOOK_DEPTH);
            assert_eq!(snap.bids().len(), BOOK_DEPTH);
            for (level, ask) in snap.asks().iter().enumerate() {
                assert_eq!(
                    ask.price,
                    snap.best_ask().unwrap().price + level as i64 * PRICE_TICK
                );
            }
            for (level, bid) in snap.bids().iter().enumerate() {
                assert_eq!(
                    bid.price,
                    snap.best_bid().unwrap().price - level as i64 * PRICE_TICK
                );
            }
            let mid = snap.mid().unwrap();
            if let Some(prev) = prev_mid {
                let moved: i64 = mid - prev;
                assert!(moved.abs() <= MAX_WALK_TICKS * PRICE_TICK);
            }
            prev_mid = Some(mid);
            assert!(snap.best_bid().unwrap().price >= 0);
        }
    }

    #[test]
    fn seeded_walks_are_reproducible() {
        let a = random_walk(1000, 50, &mut StdRng::seed_from_u64(11));
        let b = random_walk(1000, 50, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
