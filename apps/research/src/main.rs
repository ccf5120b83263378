//! research: swing/stroke structure analysis and backtests over CSV bars.
//!
//! Commands:
//! - `aggregate` resample bars to a timeframe
//! - `analyze` structure, signals and recommendation for the latest bars
//! - `backtest` sliding-window long-only backtest
//! - `history` latest signal per historical batch, optionally filtered by kind

use std::path::PathBuf;

use anyhow::{Context, Result};
use backtest::{trades_frame, BacktestConfig, BacktestEngine, SignalHistory};
use chanlun::frame::{write_parquet, write_snapshot_parquet};
use chanlun::{
	aggregate, init_logging_with_level, load_bars_csv, AnalysisProfileConfig, Bar,
	MultiTimeframeContext, Timeframe,
};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use strategy::{RuleBasedBackend, SignalConfig, SignalFilter, Strategy};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "research", about = "Chan structure research over CSV bar files")]
struct Cli {
	/// Log level: trace, debug, info, warn, error.
	#[arg(long, global = true, default_value = "info")]
	log_level: Level,

	/// Analysis profile YAML (`default` plus per-`timeframe` overrides).
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Signal generator YAML.
	#[arg(long, global = true)]
	signal_config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Args)]
struct Input {
	/// CSV file with a header row.
	#[arg(long)]
	csv: PathBuf,

	/// Target timeframe: 1m, 5m, 15m, 30m, 1h, 4h, 1d.
	#[arg(long, default_value = "1h")]
	timeframe: Timeframe,
}

#[derive(Subcommand)]
enum Command {
	/// Resample bars to the target timeframe.
	Aggregate {
		#[command(flatten)]
		input: Input,
	},
	/// Analyze the most recent bars.
	Analyze {
		#[command(flatten)]
		input: Input,

		/// Extra timeframes for a structure-only multi timeframe view.
		#[arg(long, value_delimiter = ',')]
		context: Vec<Timeframe>,

		/// Write bars/swings/strokes parquet files here.
		#[arg(long)]
		parquet_dir: Option<PathBuf>,
	},
	/// Replay the strategy over sliding windows.
	Backtest {
		#[command(flatten)]
		input: Input,

		/// Backtest YAML (`window`, `step`, `initial_capital`).
		#[arg(long)]
		backtest_config: Option<PathBuf>,

		#[arg(long)]
		window: Option<usize>,

		#[arg(long)]
		step: Option<usize>,

		#[arg(long)]
		capital: Option<Decimal>,

		/// Write the trade list as parquet.
		#[arg(long)]
		parquet: Option<PathBuf>,
	},
	/// Latest signal of each historical batch.
	History {
		#[command(flatten)]
		input: Input,

		#[arg(long, default_value_t = 50)]
		window: usize,

		#[arg(long, default_value_t = 100)]
		step: usize,

		/// `buy`, `sell` or an exact kind such as `buy2`.
		#[arg(long)]
		kind: Option<SignalFilter>,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging_with_level(cli.log_level);

	let profile = match &cli.config {
		Some(path) => AnalysisProfileConfig::from_yaml_file(path)
			.with_context(|| format!("load analysis config {}", path.display()))?,
		None => AnalysisProfileConfig::default(),
	};
	let signals = match &cli.signal_config {
		Some(path) => SignalConfig::from_yaml_file(path)
			.with_context(|| format!("load signal config {}", path.display()))?,
		None => SignalConfig::default(),
	};

	match cli.command {
		Command::Aggregate { input } => {
			let (_, bars) = load(&input)?;
			print_json(&bars)
		}
		Command::Analyze {
			input,
			context,
			parquet_dir,
		} => {
			let (base, bars) = load(&input)?;
			let analysis = Strategy::new(profile.clone(), signals).analyze(&bars, input.timeframe)?;

			if let (Some(dir), Some(structure)) = (&parquet_dir, &analysis.structure) {
				write_snapshot_parquet(input.timeframe, &bars, structure, dir)
					.with_context(|| format!("write parquet to {}", dir.display()))?;
				info!(dir = %dir.display(), "structure parquet written");
			}
			print_json(&analysis)?;

			if !context.is_empty() {
				let views = MultiTimeframeContext::new(profile).analyze(&base, &context)?;
				print_json(&views)?;
			}
			Ok(())
		}
		Command::Backtest {
			input,
			backtest_config,
			window,
			step,
			capital,
			parquet,
		} => {
			let mut config = match &backtest_config {
				Some(path) => BacktestConfig::from_yaml_file(path)
					.with_context(|| format!("load backtest config {}", path.display()))?,
				None => BacktestConfig::default(),
			};
			config.window = window.unwrap_or(config.window);
			config.step = step.unwrap_or(config.step);
			config.initial_capital = capital.unwrap_or(config.initial_capital);

			let base = load_bars_csv(&input.csv)
				.with_context(|| format!("load {}", input.csv.display()))?;
			let engine = BacktestEngine::with_backend(config, RuleBasedBackend::new(profile, signals))?;
			let result = engine.run(&base, input.timeframe)?;

			let mut frame = trades_frame(&result.trades)?;
			info!("trades\n{frame}");
			if let Some(path) = &parquet {
				write_parquet(&mut frame, path)
					.with_context(|| format!("write parquet {}", path.display()))?;
			}
			print_json(&result)
		}
		Command::History {
			input,
			window,
			step,
			kind,
		} => {
			let base = load_bars_csv(&input.csv)
				.with_context(|| format!("load {}", input.csv.display()))?;
			let report = SignalHistory::with_backend(RuleBasedBackend::new(profile, signals))
				.window(window, step)
				.filter(kind)
				.scan(&base, input.timeframe)?;
			print_json(&report)
		}
	}
}

/// Base bars from the file and the same bars at the target timeframe.
fn load(input: &Input) -> Result<(Vec<Bar>, Vec<Bar>)> {
	let base = load_bars_csv(&input.csv).with_context(|| format!("load {}", input.csv.display()))?;
	let bars = aggregate(&base, input.timeframe)?;
	Ok((base, bars))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
