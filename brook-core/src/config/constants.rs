//! Fixed parameters of the simulated market.

/// Cash seeded into every fresh account, in minor currency units.
pub const START_DEPOSIT: i64 = 1_000_000;

/// Default transaction fee in basis points (20 bps = 0.2%).
pub const DEFAULT_FEE_BPS: u32 = 20;

/// Levels carried per side of a quote snapshot.
pub const BOOK_DEPTH: usize = 10;

/// Minimum price increment. Synthetic books space their levels by this.
pub const PRICE_TICK: i64 = 1;
