//! Barforge CLI — run a backtest from a CSV bar series and a TOML
//! config, print the summary, and optionally write artifacts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use barforge_runner::{load_bars_csv, run_from_config, save_artifacts, RunConfig};

#[derive(Parser)]
#[command(name = "barforge", about = "Barforge CLI — bar-by-bar backtest engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest.
    Run {
        /// CSV bar series (timestamp,open,high,low,close,volume).
        #[arg(long)]
        data: PathBuf,

        /// TOML run configuration.
        #[arg(long)]
        config: PathBuf,

        /// Directory for artifacts (report.json, equity.csv,
        /// trades.csv, trace.jsonl). Skipped when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { data, config, out } => run(data, config, out),
    }
}

fn run(data: PathBuf, config: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let bars = load_bars_csv(&data)
        .with_context(|| format!("failed to load bars from '{}'", data.display()))?;
    let run_config = RunConfig::load(&config)
        .with_context(|| format!("failed to load config from '{}'", config.display()))?;

    let output = run_from_config(&run_config, &bars)?;
    let report = &output.report;
    let stats = &report.stats;

    println!("Run {} — {} on {}", report.run_id, report.strategy, report.symbol);
    println!("  bars:           {}", report.bar_count);
    println!("  trades:         {}", stats.total_trades);
    println!(
        "  win rate:       {:.1}%  ({} W / {} L)",
        stats.win_rate * 100.0,
        stats.winning_trades,
        stats.losing_trades
    );
    println!("  profit factor:  {:.2}", stats.profit_factor);
    println!("  max drawdown:   {:.2}%", stats.max_drawdown * 100.0);
    println!(
        "  equity:         {} -> {}  (net {})",
        stats.initial_equity, stats.final_equity, stats.net_profit
    );
    if let Some(truncated) = report.trace_truncated {
        let atoms = output.trace.as_ref().map(|t| t.atoms.len()).unwrap_or(0);
        println!(
            "  trace:          {atoms} atoms{}",
            if truncated { " (truncated)" } else { "" }
        );
    }

    if let Some(dir) = out {
        let written = save_artifacts(&dir, &output)?;
        for path in written {
            println!("  wrote {}", path.display());
        }
    }

    Ok(())
}
