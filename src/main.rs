// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Command-line front end: reads a board description, solves it, and writes
//! the result next to it.

use std::path::PathBuf;
use std::process::ExitCode;

use board_power_budget::{
    BudgetConfig, Error, PowerGraph, DEFAULT_MAX_SERIES_CHAIN, DEFAULT_MAX_SERIES_RESISTANCE,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "powerb")]
#[command(about = "Computes the power budget of a board", long_about = None)]
#[command(version)]
struct Cli {
    /// Board description to read
    #[arg(value_name = "FILE", default_value = "powerb.ini")]
    input: PathBuf,

    /// Where to write the solved board description
    #[arg(short, long, value_name = "FILE", default_value = "powerb.res.ini")]
    output: PathBuf,

    /// Print the layout diagram of the board
    #[arg(short, long)]
    diagram: bool,

    /// Largest resistance accepted for a series resistor, in Ohm
    #[arg(long, default_value_t = DEFAULT_MAX_SERIES_RESISTANCE)]
    max_series_resistance: f64,

    /// Longest chain of series resistors that can be solved
    #[arg(long, default_value_t = DEFAULT_MAX_SERIES_CHAIN)]
    max_series_chain: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("powerb: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = BudgetConfig {
        max_series_resistance: cli.max_series_resistance,
        max_series_chain: cli.max_series_chain,
    };

    let mut graph = PowerGraph::load(&cli.input, config)?;
    let layout = graph.assign_layout();
    if cli.diagram {
        print!("{layout}");
    }

    graph.calculate()?;
    graph.save(&cli.output)?;

    let input = graph.input();
    tracing::info!(
        current = input.output_current,
        power = input.output_power,
        "Wrote {}.",
        cli.output.display()
    );

    Ok(())
}
