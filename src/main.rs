use analytics::{GroupOutcome, SeriesKind, StatsConfig, StatsEngine};
use anyhow::{Context, bail};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use core_types::{Frame, TimeSeries};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Meridian performance analytics tool.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // The config file is optional for the CLI; defaults cover the common case.
    let config = match configuration::load_config() {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, "no usable config.toml, using defaults");
            configuration::Config::default()
        }
    };

    match cli.command {
        Commands::Stats(args) => handle_stats(args, config),
        Commands::Drawdowns(args) => handle_drawdowns(args),
        Commands::Table(args) => handle_table(args, config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance and risk statistics for price/return time series.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full statistics battery for every series in a CSV file.
    Stats(StatsArgs),
    /// List the drawdown episodes of one series.
    Drawdowns(DrawdownArgs),
    /// Render the month x year return grid of one series.
    Table(TableArgs),
}

#[derive(Parser)]
struct StatsArgs {
    /// CSV file: first column ISO dates, remaining columns named price series.
    file: PathBuf,

    /// Treat the input columns as periodic returns instead of price levels.
    #[arg(long)]
    returns: bool,

    /// Override the configured annualized risk-free rate.
    #[arg(long)]
    risk_free_rate: Option<f64>,

    /// Emit the snapshots as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct DrawdownArgs {
    file: PathBuf,

    /// The series column to analyze (defaults to the first one).
    #[arg(long)]
    column: Option<String>,
}

#[derive(Parser)]
struct TableArgs {
    file: PathBuf,

    /// The series column to analyze (defaults to the first one).
    #[arg(long)]
    column: Option<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_stats(args: StatsArgs, config: configuration::Config) -> anyhow::Result<()> {
    let mut series = load_frame(&args.file)?.into_series();
    if let Some(frequency) = config.analytics.target_frequency {
        series = series
            .iter()
            .map(|s| {
                if args.returns {
                    transforms::resample::resample_returns(s, frequency, config.analytics.method)
                } else {
                    transforms::resample::resample_prices(s, frequency)
                }
            })
            .collect::<Result<_, _>>()
            .context("resampling to the configured target frequency")?;
    }

    let engine = StatsEngine::new(StatsConfig {
        method: config.analytics.method,
        risk_free_rate: args
            .risk_free_rate
            .unwrap_or(config.analytics.risk_free_rate),
        base_index_value: config.analytics.base_index_value,
    });
    let kind = if args.returns {
        SeriesKind::Returns
    } else {
        SeriesKind::Prices
    };
    let group = engine.calc_group_stats(&series, kind);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&group)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec![Cell::new("Metric")];
    header.extend(group.entries.iter().map(|(name, _)| Cell::new(name)));
    table.set_header(header);

    let rows: Vec<(&str, Box<dyn Fn(&analytics::PerformanceStats) -> String>)> = vec![
        ("Start", Box::new(|s| s.start.format("%Y-%m-%d").to_string())),
        ("End", Box::new(|s| s.end.format("%Y-%m-%d").to_string())),
        ("Frequency", Box::new(|s| s.frequency.to_string())),
        ("Total Return", Box::new(|s| fmtp(s.total_return))),
        ("CAGR", Box::new(|s| fmtp(s.cagr))),
        ("Annual Vol", Box::new(|s| fmtp(s.annual_volatility))),
        ("Sharpe", Box::new(|s| fmtn(s.sharpe))),
        ("Sortino", Box::new(|s| fmtn(s.sortino))),
        ("Calmar", Box::new(|s| fmtn(s.calmar))),
        ("Max Drawdown", Box::new(|s| fmtp(s.max_drawdown))),
        ("Avg Drawdown", Box::new(|s| fmtp(s.avg_drawdown))),
        ("Avg DD Length", Box::new(|s| fmtn(s.avg_drawdown_duration))),
        (
            "Longest DD Length",
            Box::new(|s| {
                s.longest_drawdown_duration
                    .map_or_else(|| "-".to_string(), |v| v.to_string())
            }),
        ),
        ("Best Period", Box::new(|s| fmtp(s.best_period))),
        ("Worst Period", Box::new(|s| fmtp(s.worst_period))),
        ("Win/Loss Ratio", Box::new(|s| fmtn(s.win_loss_ratio))),
    ];

    for (label, render) in rows {
        let mut cells = vec![Cell::new(label)];
        for (_, outcome) in &group.entries {
            cells.push(Cell::new(match outcome {
                GroupOutcome::Ok { stats } => render(stats),
                GroupOutcome::Failed { error } => format!("error: {error}"),
            }));
        }
        table.add_row(cells);
    }

    println!("{table}");
    Ok(())
}

fn handle_drawdowns(args: DrawdownArgs) -> anyhow::Result<()> {
    let series = pick_column(load_frame(&args.file)?, args.column.as_deref())?;
    let details = transforms::drawdown::drawdown_details(&series)
        .with_context(|| format!("computing drawdowns for '{}'", series.name()))?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Start", "Trough", "Recovery", "Depth", "To Trough", "To Recovery"]);
    for detail in &details {
        table.add_row(vec![
            detail.episode.start.format("%Y-%m-%d").to_string(),
            detail.episode.trough.format("%Y-%m-%d").to_string(),
            detail
                .episode
                .recovery
                .map_or_else(|| "open".to_string(), |ts| ts.format("%Y-%m-%d").to_string()),
            fmtp(Some(detail.episode.depth)),
            detail.length_to_trough.to_string(),
            detail
                .length_to_recovery
                .map_or_else(|| "-".to_string(), |v| v.to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn handle_table(args: TableArgs, config: configuration::Config) -> anyhow::Result<()> {
    let prices = pick_column(load_frame(&args.file)?, args.column.as_deref())?;
    let method = config.analytics.method;
    let periodic = transforms::returns::to_returns(&prices, method)
        .with_context(|| format!("deriving returns for '{}'", prices.name()))?;
    let grid = transforms::resample::to_month_year_table(&periodic, method)
        .context("building the month/year table")?;

    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec![Cell::new("Year")];
    header.extend(MONTHS.iter().map(Cell::new));
    header.push(Cell::new("Total"));
    table.set_header(header);

    for row in &grid.rows {
        let mut cells = vec![Cell::new(row.year)];
        cells.extend(row.months.iter().map(|m| Cell::new(fmtpn(*m))));
        cells.push(Cell::new(fmtpn(row.total)));
        table.add_row(cells);
    }
    println!("{table}");
    Ok(())
}

// ==============================================================================
// CSV Ingestion
// ==============================================================================

/// Reads a CSV of dated observations into a `Frame`.
///
/// The first column holds ISO dates; every other column is a named series.
/// Empty cells become explicit missing values.
fn load_frame(path: &Path) -> anyhow::Result<Frame> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        bail!("expected a date column plus at least one value column");
    }
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut index = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let date_field = record
            .get(0)
            .with_context(|| format!("row {}: missing date", line + 2))?;
        let date: NaiveDate = date_field
            .trim()
            .parse()
            .with_context(|| format!("row {}: invalid date '{date_field}'", line + 2))?;
        index.push(date.and_time(NaiveTime::MIN).and_utc());

        for (column, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
            let cell = cell.trim();
            if cell.is_empty() {
                column.push(None);
            } else {
                let value: f64 = cell
                    .parse()
                    .with_context(|| format!("row {}: invalid number '{cell}'", line + 2))?;
                column.push(Some(value));
            }
        }
    }

    Ok(Frame::new(
        index,
        names.into_iter().zip(columns).collect(),
    )?)
}

fn pick_column(frame: Frame, column: Option<&str>) -> anyhow::Result<TimeSeries> {
    match column {
        Some(name) => Ok(frame.column(name)?),
        None => frame
            .into_series()
            .into_iter()
            .next()
            .context("the file holds no value columns"),
    }
}

// ==============================================================================
// Formatting Helpers
// ==============================================================================

/// Percent with sign, "-" for missing.
fn fmtp(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

/// Percent without the sign character, for dense grids.
fn fmtpn(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v * 100.0))
}

/// Plain float, "-" for missing.
fn fmtn(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
