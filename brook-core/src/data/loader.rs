//! Recorded scenario ingestion
//!
//! Reads a directory of per-symbol CSV files, one row per recorded second.
//! The header convention encodes side, level rank, and field:
//! `ask1_price, ask1_size, ..., ask10_size, bid1_price, ..., bid10_size`.
//! A leading unnamed or `second` index column is accepted and ignored.
//! Anything else in the header, or a cell that does not parse as a number,
//! is a fatal configuration error.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::constants::BOOK_DEPTH;
use crate::data::types::{BookLevel, QuoteSnapshot};
use crate::data::{ScenarioError, ScenarioFeeder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookSide {
    Ask,
    Bid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Price,
    Size,
}

/// What one CSV column contributes to a snapshot. `None` for the index
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnRole {
    side: BookSide,
    /// 0-based level rank; rank 1 in the header is the best level.
    level: usize,
    field: Field,
}

fn parse_header(name: &str) -> Option<Option<ColumnRole>> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("second") {
        return Some(None);
    }
    let (side, rest) = if let Some(rest) = trimmed.strip_prefix("ask") {
        (BookSide::Ask, rest)
    } else if let Some(rest) = trimmed.strip_prefix("bid") {
        (BookSide::Bid, rest)
    } else {
        return None;
    };
    let (rank, field) = rest.split_once('_')?;
    let rank: usize = rank.parse().ok()?;
    if !(1..=BOOK_DEPTH).contains(&rank) {
        return None;
    }
    let field = match field {
        "price" => Field::Price,
        "size" => Field::Size,
        _ => return None,
    };
    Some(Some(ColumnRole {
        side,
        level: rank - 1,
        field,
    }))
}

/// Load every `<SYMBOL>.csv` in `dir` into a feeder.
pub fn load_dir(dir: &Path) -> Result<ScenarioFeeder, ScenarioError> {
    let mut feeder = ScenarioFeeder::new();
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.path());
    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let symbol = match (path.file_stem(), path.extension()) {
            (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case("csv") => {
                stem.to_string_lossy().into_owned()
            }
            _ => return Err(ScenarioError::BadExtension { file }),
        };
        let series = load_file(&path, &file)?;
        debug!(symbol, seconds = series.len(), "loaded scenario file");
        feeder.insert(symbol, series);
    }
    Ok(feeder)
}

/// Load a single symbol file.
pub fn load_file(path: &Path, file: &str) -> Result<Vec<QuoteSnapshot>, ScenarioError> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut roles = Vec::new();
    for column in reader.headers()?.iter() {
        match parse_header(column) {
            Some(role) => roles.push(role),
            None => {
                return Err(ScenarioError::Column {
                    file: file.to_string(),
                    column: column.to_string(),
                })
            }
        }
    }

    let mut series = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let mut asks: [Option<(i64, u64)>; BOOK_DEPTH] = [None; BOOK_DEPTH];
        let mut bids: [Option<(i64, u64)>; BOOK_DEPTH] = [None; BOOK_DEPTH];
        for (role, cell) in roles.iter().zip(record.iter()) {
            let Some(role) = role else { continue };
            // Recorded files routinely carry integer columns as floats
            // ("1000.0"), so parse through f64.
            let value: f64 = cell.trim().parse().map_err(|_| ScenarioError::Cell {
                file: file.to_string(),
                row: row_idx + 1,
                column: format!("{role:?}"),
            })?;
            let slot = match role.side {
                BookSide::Ask => &mut asks[role.level],
                BookSide::Bid => &mut bids[role.level],
            };
            let (price, size) = slot.get_or_insert((0, 0));
            match role.field {
                Field::Price => *price = value as i64,
                Field::Size => *size = value as u64,
            }
        }
        series.push(QuoteSnapshot::new(collect_levels(asks), collect_levels(bids)));
    }
    if series.is_empty() {
        return Err(ScenarioError::Empty {
            file: file.to_string(),
        });
    }
    Ok(series)
}

fn collect_levels(slots: [Option<(i64, u64)>; BOOK_DEPTH]) -> Vec<BookLevel> {
    slots
        .into_iter()
        .flatten()
        .map(|(price, size)| BookLevel { price, size })
        .collect()
}
