//! Replay a recorded scenario through a strategy.
//!
//! Loads per-symbol CSV quote files from a directory and runs the
//! market-sweep strategy over them under the simulated clock. The run
//! takes as long as the host needs, not as long as the recording did.

use anyhow::{Context, Result};
use brook_bins::common::{self, CommonArgs};
use brook_core::data::ScenarioFeeder;
use brook_core::engine::Simulator;
use brook_strategies::MarketSweep;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory of <SYMBOL>.csv quote recordings
    #[arg(short, long)]
    data: PathBuf,

    /// Symbols to trade; defaults to every symbol in the data directory
    #[arg(short, long)]
    symbols: Vec<String>,

    /// Shares per order
    #[arg(short, long, default_value = "1")]
    quantity: u64,

    /// Seconds to hold the basket before selling
    #[arg(long, default_value = "10")]
    hold_seconds: u64,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(&cli.common);

    let feeder = ScenarioFeeder::from_dir(&cli.data)
        .with_context(|| format!("failed to load scenario from {}", cli.data.display()))?;

    let symbols = if cli.symbols.is_empty() {
        feeder.symbols().map(str::to_string).collect()
    } else {
        cli.symbols.clone()
    };
    tracing::info!(?symbols, "replaying scenario");

    let config = common::load_config(&cli.common)?;
    let mut strategy = MarketSweep::new(symbols, cli.quantity, cli.hold_seconds);
    let report = Simulator::new(feeder, config).run(&mut strategy)?;

    common::print_report(&report, cli.common.json_report)
}
