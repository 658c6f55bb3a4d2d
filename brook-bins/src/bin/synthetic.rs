//! Backtest against a synthetic random-walk scenario.
//!
//! Generates a seeded random-walk quote sequence for one symbol and runs
//! the buy-and-cancel strategy over it. The seed makes the whole run
//! reproducible, book and all.

use anyhow::Result;
use brook_bins::common::{self, CommonArgs};
use brook_core::data::{synthetic, ScenarioFeeder};
use brook_core::engine::Simulator;
use brook_strategies::BuyAndCancel;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Symbol to generate and trade
    #[arg(short, long, default_value = "AAA")]
    symbol: String,

    /// Starting price of the random walk
    #[arg(short, long, default_value = "1000")]
    price: i64,

    /// Length of the generated scenario in seconds
    #[arg(long, default_value = "600")]
    seconds: usize,

    /// RNG seed for the walk
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Shares per resting bid
    #[arg(short, long, default_value = "1")]
    quantity: u64,

    /// How far below the bid to rest, in price units
    #[arg(long, default_value = "50")]
    discount: i64,

    /// Seconds to let bids rest before pulling them
    #[arg(long, default_value = "30")]
    rest_seconds: u64,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(&cli.common);

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let mut feeder = ScenarioFeeder::new();
    feeder.insert(
        cli.symbol.clone(),
        synthetic::random_walk(cli.price, cli.seconds, &mut rng),
    );
    tracing::info!(
        symbol = %cli.symbol,
        seconds = cli.seconds,
        seed = cli.seed,
        "generated synthetic scenario"
    );

    let config = common::load_config(&cli.common)?;
    let mut strategy = BuyAndCancel::new(
        vec![cli.symbol.clone()],
        cli.quantity,
        cli.discount,
        cli.rest_seconds,
    );
    let report = Simulator::new(feeder, config).run(&mut strategy)?;

    common::print_report(&report, cli.common.json_report)
}
