//! Common utilities for all binaries
//!
//! Shared CLI arguments, logging setup, and report output.

use std::path::PathBuf;

use anyhow::Result;
use brook_core::config::SimConfig;
use brook_core::engine::RunReport;
use brook_core::utils::LogFormat;
use clap::Args;

/// CLI arguments shared by every binary
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to a JSON config file (deposit, fees, run cap)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Stop the run after this many simulated seconds
    #[arg(long)]
    pub max_seconds: Option<u64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Print the final report as JSON instead of log lines
    #[arg(long)]
    pub json_report: bool,
}

/// Initialize tracing/logging
pub fn init_logging(args: &CommonArgs) {
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    brook_core::utils::init_logger(&args.log_level, format);
}

/// Load the run config, applying CLI overrides on top of the file.
pub fn load_config(args: &CommonArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if args.max_seconds.is_some() {
        config.max_seconds = args.max_seconds;
    }
    Ok(config)
}

/// Print the final report
pub fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    tracing::info!("=== Final Report ===");
    tracing::info!("Strategy: {}", report.strategy);
    tracing::info!("Simulated seconds: {}", report.elapsed_seconds);
    tracing::info!("Final cash: {}", report.final_cash);
    for (symbol, holding) in &report.holdings {
        tracing::info!(
            "Holding {}: {} @ avg cost {}",
            symbol,
            holding.quantity,
            holding.average_cost
        );
    }
    tracing::info!(
        "Orders: {} placed, {} filled, {} canceled",
        report.orders_placed,
        report.orders_filled,
        report.orders_canceled
    );
    Ok(())
}
