use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ecoinvest::api::run_http_server;
use ecoinvest::config::ServeArgs;
use ecoinvest::core::{
    DEFAULT_CREDIT_PRICE, DEFAULT_TARGET_FRACTION, FundKind, SipOverrides, compute_liability,
};
use ecoinvest::dataset::load_footprint;

/// Green SIP projections, carbon liability and footprint tooling.
#[derive(Parser)]
#[command(name = "ecoinvest", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Project a monthly SIP and print the series as JSON
    Project {
        /// Monthly contribution in rupees
        #[arg(long)]
        amount: f64,

        /// Duration in whole years
        #[arg(long)]
        years: u32,

        /// Thematic portfolio supplying rate and carbon yield
        #[arg(long, default_value_t = FundKind::SolarEnergy)]
        fund: FundKind,

        /// Annual rate in percent, replacing the fund's
        #[arg(long)]
        rate: Option<f64>,

        /// kg CO2e per ₹1000 contributed, replacing the fund's
        #[arg(long = "yield")]
        yield_per_thousand: Option<f64>,
    },

    /// Compute a carbon liability record
    Liability {
        /// Baseline emissions in kg
        #[arg(long)]
        baseline: f64,

        /// Fraction of the baseline that may be retained
        #[arg(long, default_value_t = DEFAULT_TARGET_FRACTION)]
        target: f64,

        /// Credit price per kg
        #[arg(long, default_value_t = DEFAULT_CREDIT_PRICE)]
        price: f64,
    },

    /// Print the footprint baseline from a transactions CSV
    Footprint {
        #[arg(long, env = "ECOINVEST_DATASET")]
        dataset: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Command::Serve(args) => run_http_server(&args).await.map_err(|e| e.to_string()),
        Command::Project {
            amount,
            years,
            fund,
            rate,
            yield_per_thousand,
        } => project_command(amount, years, fund, rate, yield_per_thousand),
        Command::Liability {
            baseline,
            target,
            price,
        } => compute_liability(baseline, target, price)
            .map_err(|e| e.to_string())
            .and_then(|record| print_json(&record)),
        Command::Footprint { dataset } => print_json(&load_footprint(dataset.as_deref())),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn project_command(
    amount: f64,
    years: u32,
    fund: FundKind,
    rate: Option<f64>,
    yield_per_thousand: Option<f64>,
) -> Result<(), String> {
    let overrides = SipOverrides {
        annual_rate_percent: rate,
        yield_per_thousand,
    };
    let projection = fund
        .fund()
        .project_sip(amount, years, overrides)
        .map_err(|e| e.to_string())?;
    print_json(&projection)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
