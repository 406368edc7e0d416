//! SqueezeLab CLI: run the squeeze breakout analysis and manage bar files.
//!
//! Commands:
//! - `run`: load bars, detect squeezes, measure breakouts, save artifacts
//! - `fetch`: download Binance klines to a CSV file
//! - `synth`: write a synthetic bar CSV for offline experiments

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use squeezelab_core::data::{
    generate_synthetic_bars, write_bars_csv, BarProvider, BinanceProvider, SyntheticConfig,
};
use squeezelab_runner::{
    run_analysis, save_artifacts, summary_table, AnalysisConfig, AnalysisResult,
};

#[derive(Parser)]
#[command(
    name = "squeezelab",
    about = "SqueezeLab CLI: volatility squeeze detection and breakout measurement"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis on a CSV file, fetched klines, or synthetic bars.
    Run(RunArgs),
    /// Download klines from Binance and write them to CSV.
    Fetch {
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        #[arg(long, default_value = "1h")]
        interval: String,

        /// Number of klines (Binance caps this at 1000).
        #[arg(long, default_value_t = 1000)]
        limit: usize,

        /// Output file. Defaults to data/{symbol}_{interval}.csv.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a synthetic bar CSV.
    Synth {
        #[arg(long, default_value_t = 2000)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value = "data/synthetic_1h.csv")]
        output: PathBuf,
    },
}

/// Flags for `run`. Anything given here overrides the TOML config.
#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV data file; fetched bars are saved here when it is missing.
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long)]
    symbol: Option<String>,

    #[arg(long)]
    interval: Option<String>,

    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    bb_window: Option<usize>,

    /// Bollinger standard deviation multiplier.
    #[arg(long)]
    bb_std: Option<f64>,

    #[arg(long)]
    atr_window: Option<usize>,

    /// Bandwidth quantile threshold, in (0, 1).
    #[arg(long)]
    bw_quantile: Option<f64>,

    /// ATR quantile threshold, in (0, 1).
    #[arg(long)]
    atr_quantile: Option<f64>,

    /// Hold periods in bars, comma separated (e.g. 1,4,12,24,168).
    #[arg(long, value_delimiter = ',')]
    hold_periods: Option<Vec<usize>>,

    /// Use expanding thresholds so no bar sees later data.
    #[arg(long, default_value_t = false)]
    causal: bool,

    /// Defined values required before an expanding threshold applies.
    #[arg(long)]
    min_history: Option<usize>,

    /// Offline mode: no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Use synthetic data as fallback.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for synthetic data.
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the per-bar indicator table (annotated.csv).
    #[arg(long, default_value_t = false)]
    annotated: bool,

    /// Output directory for artifacts.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,
}

impl RunArgs {
    fn build_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };

        let data = &mut config.data;
        if let Some(file) = &self.file {
            data.file = file.clone();
        }
        if let Some(symbol) = &self.symbol {
            data.symbol = symbol.clone();
        }
        if let Some(interval) = &self.interval {
            data.interval = interval.clone();
        }
        if let Some(limit) = self.limit {
            data.limit = limit;
        }
        if let Some(seed) = self.seed {
            data.seed = seed;
        }
        data.offline |= self.offline;
        data.synthetic |= self.synthetic;

        let ind = &mut config.indicators;
        if let Some(v) = self.bb_window {
            ind.bb_window = v;
        }
        if let Some(v) = self.bb_std {
            ind.bb_std_multiplier = v;
        }
        if let Some(v) = self.atr_window {
            ind.atr_window = v;
        }

        if let Some(v) = self.bw_quantile {
            config.squeeze.bandwidth_quantile = v;
        }
        if let Some(v) = self.atr_quantile {
            config.squeeze.atr_quantile = v;
        }
        config.squeeze.causal |= self.causal;
        if let Some(v) = self.min_history {
            config.squeeze.min_history = v;
        }

        if let Some(holds) = &self.hold_periods {
            config.breakout.hold_periods = holds.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd(&args),
        Commands::Fetch {
            symbol,
            interval,
            limit,
            output,
        } => fetch_cmd(&symbol, &interval, limit, output),
        Commands::Synth { bars, seed, output } => synth_cmd(bars, seed, &output),
    }
}

fn run_cmd(args: &RunArgs) -> Result<()> {
    let config = args.build_config()?;
    debug!(?config, "effective config");
    println!(
        "--- Starting squeeze analysis for {} {} ---",
        config.data.symbol, config.data.interval
    );

    let provider = if config.data.offline {
        None
    } else {
        Some(BinanceProvider::new()?)
    };
    let provider_ref = provider.as_ref().map(|p| p as &dyn BarProvider);

    let result = run_analysis(&config, provider_ref)?;
    print_counts(&result);

    if result.squeeze_event_count == 0 {
        println!("No completed squeezes found. Try adjusting thresholds.");
        return Ok(());
    }
    if result.outcomes.is_empty() {
        println!("No valid breakout tests completed (not enough data after squeezes).");
        return Ok(());
    }

    println!("\n--- Breakout Results Summary ---\n");
    print!("{}", summary_table(&result.summary));

    let run_dir = save_artifacts(&result, &args.output_dir, args.annotated)?;
    println!("\nArtifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_counts(result: &AnalysisResult) {
    let synthetic = if result.has_synthetic { " [SYNTHETIC]" } else { "" };
    println!(
        "Loaded {} bars from {} to {}{synthetic}",
        result.bar_count, result.first_timestamp, result.last_timestamp
    );
    println!(
        "Identified {} squeeze bars and {} squeeze breakout events.",
        result.squeeze_bar_count, result.squeeze_event_count
    );
    if let Some(open) = &result.open_region {
        println!(
            "A squeeze is still in progress ({} bars since {}).",
            open.duration,
            open.start_time.to_rfc3339()
        );
    }
}

fn fetch_cmd(symbol: &str, interval: &str, limit: usize, output: Option<PathBuf>) -> Result<()> {
    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("data/{symbol}_{interval}.csv")));
    let provider = BinanceProvider::new()?;
    let bars = provider
        .fetch(symbol, interval, limit)
        .with_context(|| format!("failed to fetch {symbol} {interval}"))?;
    write_bars_csv(&output, &bars)?;
    println!("Saved {} bars to {}", bars.len(), output.display());
    Ok(())
}

fn synth_cmd(bars: usize, seed: u64, output: &std::path::Path) -> Result<()> {
    let generated = generate_synthetic_bars(&SyntheticConfig {
        bars,
        seed,
        ..SyntheticConfig::default()
    });
    write_bars_csv(output, &generated)?;
    println!(
        "Wrote {} synthetic bars (seed {seed}) to {}",
        generated.len(),
        output.display()
    );
    Ok(())
}
