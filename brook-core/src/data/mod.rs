//! Scenario data: recorded and synthetic quote sequences.
//!
//! The feeder maps `(symbol, elapsed second)` to an immutable
//! [`QuoteSnapshot`]. A lookup past the end of a sequence is not an error at
//! this layer: it signals end-of-scenario, which callers treat as the
//! normal termination of the whole simulated session.

pub mod loader;
pub mod synthetic;
pub mod types;

pub use types::{BookLevel, QuoteSnapshot};

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while ingesting scenario data. All of these are fatal
/// configuration errors: bad input data aborts the run before it starts.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario directory")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario file")]
    Csv(#[from] csv::Error),

    #[error("scenario file {file} is not a .csv file")]
    BadExtension { file: String },

    #[error("unexpected column {column:?} in {file}")]
    Column { file: String, column: String },

    #[error("row {row} of {file} has a malformed {column:?} cell")]
    Cell {
        file: String,
        row: usize,
        column: String,
    },

    #[error("scenario file {file} contains no rows")]
    Empty { file: String },
}

/// Per-symbol quote sequences indexed by elapsed simulated second.
#[derive(Debug, Default)]
pub struct ScenarioFeeder {
    books: HashMap<String, Vec<QuoteSnapshot>>,
}

impl ScenarioFeeder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<SYMBOL>.csv` file in a directory.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        loader::load_dir(path.as_ref())
    }

    /// Install (or replace) the quote sequence for a symbol.
    pub fn insert(&mut self, symbol: impl Into<String>, series: Vec<QuoteSnapshot>) {
        self.books.insert(symbol.into(), series);
    }

    /// Snapshot for a symbol at an elapsed second. `None` once the sequence
    /// is exhausted, which is the end-of-scenario signal.
    pub fn snapshot(&self, symbol: &str, second: u64) -> Option<&QuoteSnapshot> {
        let series = self.books.get(symbol)?;
        usize::try_from(second).ok().and_then(|idx| series.get(idx))
    }

    /// Whether any data was loaded for the symbol.
    pub fn contains(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }

    /// Length of a symbol's sequence in seconds.
    pub fn seconds(&self, symbol: &str) -> Option<u64> {
        self.books.get(symbol).map(|s| s.len() as u64)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic;

    #[test]
    fn lookup_past_the_end_is_none() {
        let mut feeder = ScenarioFeeder::new();
        feeder.insert("AAA", synthetic::flat(1000, 3));
        assert!(feeder.snapshot("AAA", 0).is_some());
        assert!(feeder.snapshot("AAA", 2).is_some());
        assert!(feeder.snapshot("AAA", 3).is_none());
        assert_eq!(feeder.seconds("AAA"), Some(3));
    }

    #[test]
    fn unknown_symbol_is_distinguishable() {
        let feeder = ScenarioFeeder::new();
        assert!(!feeder.contains("BBB"));
        assert!(feeder.snapshot("BBB", 0).is_none());
    }
}
